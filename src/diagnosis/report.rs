//! HTML side report of a failed build

use super::error_report::ErrorReport;

/// File name of the side report
pub const FAILURE_REPORT_FILE: &str = "Failed xmake jobs - error details.html";

const TITLE: &str = "Failed xmake jobs - error details";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Label of a console link: `<name> #<number>`.
///
/// Links with fewer than four path segments get no entry.
fn console_link_label(url: &str) -> Option<String> {
    let parts: Vec<&str> = url.split('/').collect();
    if parts.len() <= 3 {
        return None;
    }
    Some(format!("{} #{}", parts[parts.len() - 3], parts[parts.len() - 2]))
}

/// Render the side report.
///
/// Each section header is only emitted when the section has entries.
pub fn render_failure_report(errors: &ErrorReport, console_links: &[String]) -> String {
    let mut html = format!("<html><body><h3>{}</h3>", TITLE);

    if !errors.is_empty() {
        html.push_str("<b>xmake errors:</b>");
    }
    for (job, message) in errors.iter() {
        html.push_str(&format!("<li>{} : <b>{}</b></li>", escape(job), escape(message)));
    }

    if !console_links.is_empty() {
        html.push_str("<b>Console error links:</b>");
    }
    for url in console_links {
        if let Some(label) = console_link_label(url) {
            html.push_str(&format!("<li><a href={}>{}</a></li>", url, escape(&label)));
        }
    }

    html.push_str("</body></html>");
    html
}
