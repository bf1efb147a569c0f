use kopipe_scan::classify::classify;
use kopipe_scan::fetch::{FetchError, FetchResponse};
use kopipe_scan::types::{Category, ResultRecord};
use pretty_assertions::assert_eq;

const URL: &str = "https://kopipe.net/up/3ab";

fn page(status: u16, body: &str) -> (Category, ResultRecord) {
    let c = classify("3ab", URL, &Ok(FetchResponse::new(status, body)));
    (c.category, c.record)
}

#[test]
fn transport_error_is_fail() {
    let c = classify("3ab", URL, &Err(FetchError("connection refused".into())));
    assert_eq!(c.category, Category::Fail);
    assert_eq!(c.record, ResultRecord::new("3ab", "Fetch failed: connection refused", URL));
}

#[test]
fn not_found_is_filtered() {
    let c = classify("3ab", URL, &Ok(FetchResponse::status_only(404)));
    assert_eq!(c.category, Category::Filtered);
    assert_eq!(c.record.message, "No file found");
}

#[test]
fn server_error_is_fail() {
    let c = classify("3ab", URL, &Ok(FetchResponse::status_only(503)));
    assert_eq!(c.category, Category::Fail);
    assert_eq!(c.record.message, "Server Error (503)");
}

#[test]
fn plain_title_is_success_without_lock_field() {
    let (cat, rec) = page(200, "<title>My File Download</title>");
    assert_eq!(cat, Category::Success);
    assert_eq!(rec, ResultRecord::new("3ab", "My File", URL));
}

#[test]
fn error_page_title_is_filtered() {
    let (cat, rec) = page(200, "<title>Kopipe Error</title>");
    assert_eq!(cat, Category::Filtered);
    assert_eq!(rec.message, "No file found");
}

#[test]
fn missing_title_is_success_with_empty_message() {
    let (cat, rec) = page(200, "<html><body>nothing</body></html>");
    assert_eq!(cat, Category::Success);
    assert_eq!(rec.message, "");
}

#[test]
fn other_4xx_inspects_body() {
    let (cat, rec) = page(403, "<title>Forbidden</title>");
    assert_eq!(cat, Category::Success);
    assert_eq!(rec.message, "Forbidden");
}

#[test]
fn lock_marker_without_image_title_is_locked() {
    let body = r#"<title>secret.zip Download</title><img src="//static-up.kopipe.net/locked.png">"#;
    let (cat, rec) = page(200, body);
    assert_eq!(cat, Category::Locked);
    assert_eq!(rec, ResultRecord::new("3ab", "secret.zip", URL).with_locked(true));
}

#[test]
fn image_title_with_cdn_img_is_image() {
    let body = r#"<title>cat.PNG Download</title><img src="https://pc286.kopipe.net/f/cat.png">"#;
    let (cat, rec) = page(200, body);
    assert_eq!(cat, Category::Images);
    assert_eq!(
        rec,
        ResultRecord::new("3ab", "cat.PNG", URL)
            .with_img_url("https://pc286.kopipe.net/f/cat.png")
            .with_locked(false)
    );
}

#[test]
fn locked_image_stays_in_images_bucket() {
    let body = concat!(
        r#"<title>cat.gif Download</title>"#,
        r#"<img src="//static-up.kopipe.net/locked.png">"#,
        r#"<img src="https://pc286.kopipe.net/f/cat.gif">"#,
    );
    let (cat, rec) = page(200, body);
    assert_eq!(cat, Category::Images);
    assert_eq!(rec.locked, Some(true));
}

// Image titles without a CDN image land in success but keep the lock flag,
// unlike plain successes which carry no `locked` key at all.
#[test]
fn image_title_without_cdn_img_is_success_with_lock_flag() {
    let (cat, rec) = page(200, "<title>cat.jpg Download</title>");
    assert_eq!(cat, Category::Success);
    assert_eq!(rec, ResultRecord::new("3ab", "cat.jpg", URL).with_locked(false));

    let body = r#"<title>cat.jpg Download</title><img src="//static-up.kopipe.net/locked.png">"#;
    let (cat, rec) = page(200, body);
    assert_eq!(cat, Category::Success);
    assert_eq!(rec.locked, Some(true));
}

#[test]
fn image_check_runs_before_error_page_check() {
    let (cat, _) = page(200, "<title>kopipe error.png</title>");
    assert_eq!(cat, Category::Success);
}

#[test]
fn classification_is_deterministic() {
    let body = r#"<title>a.jpeg</title><img src="https://pc286.kopipe.net/a.jpeg">"#;
    assert_eq!(page(200, body), page(200, body));
}
