//! Sorting of one upstream response into a result bucket.
//!
//! Extraction is plain regex matching against the raw HTML. The patterns are
//! tied to the upstream site's markup: first match only, case-insensitive,
//! fixed attribute prefixes.

use std::sync::LazyLock;

use regex::Regex;

use crate::fetch::FetchOutcome;
use crate::types::{Category, ResultRecord};

/// Path of the padlock icon shown on password-protected uploads.
pub const LOCKED_ICON_SRC: &str = "//static-up.kopipe.net/locked.png";
/// Host serving direct image assets.
pub const IMAGE_CDN_PREFIX: &str = "https://pc286.kopipe.net/";
/// Extensions that mark an upload title as an image.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

const DOWNLOAD_SUFFIX: &str = " Download";
const ERROR_PAGE_TITLE: &str = "kopipe error";
const NOT_FOUND_MESSAGE: &str = "No file found";

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

regex!(TITLE_REGEX, r"(?i)<title>(.*?)</title>");
regex!(
    LOCKED_REGEX,
    format!(r#"(?i)<img src="{}""#, regex::escape(LOCKED_ICON_SRC)).as_str()
);
regex!(
    IMAGE_EXT_REGEX,
    format!(r"(?i)\.(?:{})", IMAGE_EXTENSIONS.join("|")).as_str()
);
regex!(
    IMAGE_SRC_REGEX,
    format!(r#"(?i)<img\s+src="({}[^"]+)""#, regex::escape(IMAGE_CDN_PREFIX)).as_str()
);

/// A record together with the bucket it belongs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub category: Category,
    pub record: ResultRecord,
}

impl Classified {
    fn new(category: Category, record: ResultRecord) -> Self {
        Self { category, record }
    }
}

/// Classify the outcome of fetching `url` for `code`.
///
/// Decision order: transport error, 404, 5xx, then page inspection
/// (image title, error page, lock marker).
pub fn classify(code: &str, url: &str, outcome: &FetchOutcome) -> Classified {
    let response = match outcome {
        Err(err) => {
            return Classified::new(
                Category::Fail,
                ResultRecord::new(code, format!("Fetch failed: {err}"), url),
            )
        }
        Ok(response) => response,
    };

    if response.status == 404 {
        return Classified::new(
            Category::Filtered,
            ResultRecord::new(code, NOT_FOUND_MESSAGE, url),
        );
    }
    if response.status >= 500 {
        return Classified::new(
            Category::Fail,
            ResultRecord::new(code, format!("Server Error ({})", response.status), url),
        );
    }

    classify_page(code, url, response.body.as_deref().unwrap_or(""))
}

fn classify_page(code: &str, url: &str, body: &str) -> Classified {
    let title = page_title(body);
    let locked = has_lock_marker(body);
    let clean_title = strip_download_suffix(title);

    if mentions_image_extension(clean_title) {
        let record = ResultRecord::new(code, clean_title, url);
        return match image_url(body) {
            Some(img) => Classified::new(Category::Images, record.with_img_url(img).with_locked(locked)),
            None => Classified::new(Category::Success, record.with_locked(locked)),
        };
    }

    if title.to_lowercase() == ERROR_PAGE_TITLE {
        return Classified::new(
            Category::Filtered,
            ResultRecord::new(code, NOT_FOUND_MESSAGE, url),
        );
    }

    if locked {
        Classified::new(
            Category::Locked,
            ResultRecord::new(code, clean_title, url).with_locked(true),
        )
    } else {
        // Plain successes carry no `locked` key.
        Classified::new(Category::Success, ResultRecord::new(code, clean_title, url))
    }
}

/// Trimmed text of the first `<title>` element, or `""` when there is none.
pub fn page_title(html: &str) -> &str {
    TITLE_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .unwrap_or("")
}

pub fn has_lock_marker(html: &str) -> bool {
    LOCKED_REGEX.is_match(html)
}

/// First `<img src>` pointing at the image CDN.
pub fn image_url(html: &str) -> Option<&str> {
    IMAGE_SRC_REGEX
        .captures(html)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

pub fn strip_download_suffix(title: &str) -> &str {
    title.strip_suffix(DOWNLOAD_SUFFIX).unwrap_or(title)
}

/// True when `title` contains `.png`, `.jpg`, `.jpeg` or `.gif` anywhere.
pub fn mentions_image_extension(title: &str) -> bool {
    IMAGE_EXT_REGEX.is_match(title)
}
