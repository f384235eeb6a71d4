//! Renders a harvested page into the text block handed to the answer model.

use serde::Serialize;
use serde_json::Value;

const LIST_SEPARATOR: &str = ", ";
const UNKNOWN_SECTOR: &str = "Not specified";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    #[error("missing field `{0}` in harvested data")]
    MissingField(String),

    #[error("could not format harvested data: {0}")]
    Failure(String),
}

/// Renders a page through its document form.
pub fn render_page(page: &impl Serialize) -> Result<String, FormatError> {
    let doc = serde_json::to_value(page).map_err(|e| FormatError::Failure(e.to_string()))?;
    render(&doc)
}

/// Renders the harvested structure in its document form.
///
/// Every key is required; `metadata.industry_sector` may be `null`. Empty
/// lists are valid and render as empty lines.
pub fn render(doc: &Value) -> Result<String, FormatError> {
    let metadata = lookup(doc, "metadata")?;
    let website_url = as_text(lookup(metadata, "metadata.website_url")?, "metadata.website_url")?;
    let page_title = as_text(lookup(metadata, "metadata.page_title")?, "metadata.page_title")?;
    let industry = match lookup(metadata, "metadata.industry_sector")? {
        Value::Null => UNKNOWN_SECTOR,
        other => as_text(other, "metadata.industry_sector")?,
    };

    let contact = lookup(doc, "contact_information")?;
    let emails = joined(contact, "contact_information.emails", LIST_SEPARATOR)?;
    let phones = joined(contact, "contact_information.phone_numbers", LIST_SEPARATOR)?;
    let addresses = joined(contact, "contact_information.addresses", LIST_SEPARATOR)?;

    let social = joined(doc, "social_media", "\n")?;

    let metadata_section = format!(
        "Website URL: {website_url}\nPage Title: {page_title}\nIndustry/Sector: {industry}\n"
    );
    let contact_section = format!(
        "Contact Information:\nEmails: {emails}\nPhone Numbers: {phones}\nAddresses: {addresses}\n"
    );
    let social_section = format!("Social Media Links:\n{social}");

    Ok(format!("{metadata_section}\n{contact_section}\n{social_section}"))
}

/// Looks up the last segment of a dotted `path` in `parent`.
fn lookup<'a>(parent: &'a Value, path: &str) -> Result<&'a Value, FormatError> {
    let key = path.rsplit('.').next().unwrap_or(path);
    let object = parent
        .as_object()
        .ok_or_else(|| FormatError::Failure(format!("expected an object containing `{path}`")))?;
    object
        .get(key)
        .ok_or_else(|| FormatError::MissingField(path.to_string()))
}

fn as_text<'a>(value: &'a Value, path: &str) -> Result<&'a str, FormatError> {
    value
        .as_str()
        .ok_or_else(|| FormatError::Failure(format!("`{path}` must be a string")))
}

fn joined(parent: &Value, path: &str, separator: &str) -> Result<String, FormatError> {
    let items = lookup(parent, path)?
        .as_array()
        .ok_or_else(|| FormatError::Failure(format!("`{path}` must be a list")))?;
    let texts = items
        .iter()
        .map(|item| as_text(item, path))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(texts.join(separator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harvest::page::{ContactInformation, HarvestedPage, PageMetadata};
    use serde_json::json;

    fn sample_page() -> HarvestedPage {
        HarvestedPage {
            metadata: PageMetadata {
                website_url: "https://acme.example".into(),
                page_title: "Acme Corp".into(),
                industry_sector: Some("Anvils".into()),
            },
            contact_information: ContactInformation {
                emails: ["sales@acme.example", "info@acme.example"].into_iter().collect(),
                phone_numbers: ["800-555-1234"].into_iter().collect(),
                addresses: vec!["1 Desert Road".into(), "PO Box 9".into()],
            },
            social_media: vec![
                "https://twitter.com/acme".into(),
                "https://linkedin.com/company/acme".into(),
            ],
        }
    }

    #[test]
    fn renders_all_sections_in_order() {
        let text = render_page(&sample_page()).unwrap();
        assert_eq!(
            text,
            "Website URL: https://acme.example\n\
             Page Title: Acme Corp\n\
             Industry/Sector: Anvils\n\
             \n\
             Contact Information:\n\
             Emails: info@acme.example, sales@acme.example\n\
             Phone Numbers: 800-555-1234\n\
             Addresses: 1 Desert Road, PO Box 9\n\
             \n\
             Social Media Links:\n\
             https://twitter.com/acme\n\
             https://linkedin.com/company/acme"
        );
    }

    #[test]
    fn rendering_is_deterministic() {
        let page = sample_page();
        assert_eq!(render_page(&page).unwrap(), render_page(&page.clone()).unwrap());

        let doc = serde_json::to_value(&page).unwrap();
        assert_eq!(render(&doc).unwrap(), render(&doc).unwrap());
    }

    #[test]
    fn empty_collections_render_empty_lines() {
        let page = HarvestedPage {
            metadata: PageMetadata {
                website_url: "https://x.com".into(),
                page_title: "X".into(),
                industry_sector: None,
            },
            contact_information: ContactInformation {
                emails: ["a@x.com", "b@x.com"].into_iter().collect(),
                ..Default::default()
            },
            social_media: vec![],
        };

        let text = render_page(&page).unwrap();
        assert!(text.contains("Emails: a@x.com, b@x.com\n"), "got: {text}");
        assert!(text.contains("Phone Numbers: \n"), "got: {text}");
        assert!(text.contains("Addresses: \n"), "got: {text}");
        assert!(text.contains("Industry/Sector: Not specified\n"), "got: {text}");
        assert!(text.ends_with("Social Media Links:\n"), "got: {text}");
    }

    #[test]
    fn missing_keys_are_named() {
        let required = [
            ("metadata", None),
            ("metadata.website_url", Some("metadata")),
            ("metadata.page_title", Some("metadata")),
            ("metadata.industry_sector", Some("metadata")),
            ("contact_information", None),
            ("contact_information.emails", Some("contact_information")),
            ("contact_information.phone_numbers", Some("contact_information")),
            ("contact_information.addresses", Some("contact_information")),
            ("social_media", None),
        ];

        for (path, parent) in required {
            let mut doc = serde_json::to_value(sample_page()).unwrap();
            let key = path.rsplit('.').next().unwrap();
            let container = match parent {
                Some(p) => doc.get_mut(p).unwrap(),
                None => &mut doc,
            };
            container.as_object_mut().unwrap().remove(key);

            assert_eq!(
                render(&doc),
                Err(FormatError::MissingField(path.to_string())),
                "removing {path}"
            );
        }
    }

    #[test]
    fn wrong_types_are_generic_failures() {
        let mut doc = serde_json::to_value(sample_page()).unwrap();
        doc["contact_information"]["emails"] = json!("info@acme.example");
        assert!(matches!(render(&doc), Err(FormatError::Failure(_))));

        let mut doc = serde_json::to_value(sample_page()).unwrap();
        doc["social_media"] = json!([1, 2]);
        assert!(matches!(render(&doc), Err(FormatError::Failure(_))));

        assert!(matches!(render(&json!([])), Err(FormatError::Failure(_))));
    }

    #[test]
    fn missing_field_message_names_key() {
        let err = FormatError::MissingField("contact_information.emails".into());
        assert!(err.to_string().contains("contact_information.emails"));
    }
}
