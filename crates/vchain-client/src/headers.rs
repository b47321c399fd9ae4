//! Browser header profile.
//!
//! Every request carries the header set of one coherent desktop browser
//! version. There are three flavours: authenticated API calls, cross-origin
//! binary uploads, and plain external fetches.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::error::{ClientError, ClientResult};

const ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
const NAVIGATION_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8";

/// Header values identifying one browser build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserProfile {
    pub user_agent: String,
    pub sec_ch_ua: String,
    pub sec_ch_ua_platform: String,
    /// Web app origin, without trailing slash
    pub app_origin: String,
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::chrome_126(crate::config::DEFAULT_APP_ORIGIN)
    }
}

impl BrowserProfile {
    /// Chrome 126 on Windows.
    pub fn chrome_126(app_origin: impl Into<String>) -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36".to_string(),
            sec_ch_ua: r#""Not/A)Brand";v="8", "Chromium";v="126", "Google Chrome";v="126""#.to_string(),
            sec_ch_ua_platform: r#""Windows""#.to_string(),
            app_origin: app_origin.into().trim_end_matches('/').to_string(),
        }
    }

    /// Headers for an authenticated JSON API call.
    pub fn api_headers(&self, token: &str) -> ClientResult<HeaderMap> {
        let mut headers = self.common(&self.app_origin, "same-site")?;
        insert(&mut headers, "accept", "application/json")?;
        insert(&mut headers, "content-type", "application/json")?;
        let auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::invalid_credential("token is not a valid header value"))?;
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        Ok(headers)
    }

    /// Headers for a cross-origin binary upload. No authorization.
    pub fn upload_headers(&self, content_type: &str, content_length: usize) -> ClientResult<HeaderMap> {
        let mut headers = self.common(&self.app_origin, "cross-site")?;
        insert(&mut headers, "accept", "*/*")?;
        insert(&mut headers, "content-type", content_type)?;
        insert(&mut headers, "content-length", &content_length.to_string())?;
        Ok(headers)
    }

    /// Headers for a plain fetch of an external URL. No authorization.
    pub fn external_headers(&self, target: &Url) -> ClientResult<HeaderMap> {
        let origin = target.origin().ascii_serialization();
        let mut headers = self.common(&origin, "same-site")?;
        insert(&mut headers, "accept", NAVIGATION_ACCEPT)?;
        Ok(headers)
    }

    fn common(&self, origin: &str, fetch_site: &str) -> ClientResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        insert(&mut headers, "accept-language", ACCEPT_LANGUAGE)?;
        insert(&mut headers, "origin", origin)?;
        insert(&mut headers, "referer", &format!("{}/", self.app_origin))?;
        insert(&mut headers, "priority", "u=1, i")?;
        insert(&mut headers, "sec-ch-ua", &self.sec_ch_ua)?;
        insert(&mut headers, "sec-ch-ua-mobile", "?0")?;
        insert(&mut headers, "sec-ch-ua-platform", &self.sec_ch_ua_platform)?;
        insert(&mut headers, "sec-fetch-dest", "empty")?;
        insert(&mut headers, "sec-fetch-mode", "cors")?;
        insert(&mut headers, "sec-fetch-site", fetch_site)?;
        insert(&mut headers, "user-agent", &self.user_agent)?;
        Ok(headers)
    }
}

fn insert(headers: &mut HeaderMap, name: &'static str, value: &str) -> ClientResult<()> {
    let value = HeaderValue::from_str(value)
        .map_err(|_| ClientError::config(format!("invalid value for header {}", name)))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(())
}
