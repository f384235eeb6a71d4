use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub web_pages: Option<WebPages>,
}

#[derive(Debug, Deserialize)]
pub struct WebPages {
    #[serde(default)]
    pub value: Vec<WebPage>,
}

#[derive(Debug, Deserialize)]
pub struct WebPage {
    pub url: String,
}

impl SearchResponse {
    /// Result URLs in provider order.
    pub fn into_urls(self) -> Vec<String> {
        self.web_pages
            .map(|pages| pages.value.into_iter().map(|page| page.url).collect())
            .unwrap_or_default()
    }
}
