//! Response Rendering for Routing Outcomes

use std::path::Path;

use actix_files::NamedFile;
use actix_web::{
    HttpRequest, HttpResponse,
    http::{StatusCode, header},
    mime,
    web::Bytes,
};
use futures_util::stream;

use super::{Outcome, index::DirectoryEntry, uri::encode_segment};
use crate::config::Configuration;

/// Turn an outcome into the response sent to the client.
pub async fn respond(req: &HttpRequest, outcome: Outcome, config: &Configuration) -> HttpResponse {
    match outcome {
        Outcome::ServeFile(path) => match NamedFile::open_async(&path).await {
            Ok(file) => serve_file(req, file, config),
            Err(err) => {
                log::debug!("failed to open {path:?}: {err}");
                error(Outcome::from_io(&err).status_code())
            }
        },
        Outcome::ServeListing { uri, entries } => listing(&uri, &entries),
        Outcome::VirtualRootListing(entries) => listing("/", &entries),
        Outcome::RedirectToDirectory(location) => redirect(&location),
        outcome => error(outcome.status_code()),
    }
}

/// Text after the final `.` of the filename, including for dotfiles.
fn extension(path: &Path) -> &str {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext)
        .unwrap_or_default()
}

fn serve_file(req: &HttpRequest, file: NamedFile, config: &Configuration) -> HttpResponse {
    let ext = extension(file.path());
    let content_type = config
        .mime_types()
        .lookup(ext)
        .parse::<mime::Mime>()
        .unwrap_or(mime::APPLICATION_OCTET_STREAM);
    file.set_content_type(content_type)
        .use_etag(false)
        .use_last_modified(false)
        .disable_content_disposition()
        .into_response(req)
}

fn redirect(location: &str) -> HttpResponse {
    HttpResponse::MovedPermanently()
        .insert_header((header::LOCATION, location))
        .finish()
}

/// Stream html chunks without a known content length.
fn chunked(status: StatusCode, chunks: Vec<String>) -> HttpResponse {
    let body = stream::iter(
        chunks
            .into_iter()
            .map(|chunk| Ok::<_, actix_web::Error>(Bytes::from(chunk))),
    );
    HttpResponse::build(status)
        .content_type(mime::TEXT_HTML)
        .streaming(body)
}

fn listing(uri: &str, entries: &[DirectoryEntry]) -> HttpResponse {
    chunked(StatusCode::OK, listing_page(uri, entries))
}

fn error(status: StatusCode) -> HttpResponse {
    chunked(status, vec![error_page(status)])
}

pub fn listing_page(uri: &str, entries: &[DirectoryEntry]) -> Vec<String> {
    let title = escape_html(uri);
    let mut chunks = vec![format!(
        "<html>\n<head>\n<title>Index of {title}</title>\n</head>\n<body>\n<h1>Index of {title}</h1>\n"
    )];
    if uri != "/" {
        chunks.push("<a href=\"../\">&lt;Parent Directory&gt;</a><br>\n".to_owned());
    }
    chunks.extend(entries.iter().map(|entry| {
        let mut href = encode_segment(&entry.name);
        if entry.is_directory {
            href.push('/');
        }
        format!(
            "<a href=\"{href}\">{}</a><br>\n",
            escape_html(&entry.label())
        )
    }));
    chunks.push("</body>\n</html>\n".to_owned());
    chunks
}

pub fn error_page(status: StatusCode) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    format!(
        "<html><head><title>{} {reason}</title></head><body><h1>{reason}</h1></body></html>",
        status.as_u16()
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_listing_has_no_parent_link() {
        let page = listing_page("/", &[DirectoryEntry::new("music", true)]).concat();
        assert_eq!(
            page,
            "<html>\n<head>\n<title>Index of /</title>\n</head>\n<body>\n\
             <h1>Index of /</h1>\n\
             <a href=\"music/\">music/</a><br>\n\
             </body>\n</html>\n"
        );
    }

    #[test]
    fn nested_listing_links_parent() {
        let entries = [
            DirectoryEntry::new("a b.txt", false),
            DirectoryEntry::new("<sub>", true),
        ];
        let page = listing_page("/music/albums/", &entries).concat();
        assert!(page.contains("<title>Index of /music/albums/</title>"));
        assert!(page.contains("<a href=\"../\">&lt;Parent Directory&gt;</a><br>\n"));
        assert!(page.contains("<a href=\"a%20b.txt\">a b.txt</a><br>\n"));
        assert!(page.contains("<a href=\"%3Csub%3E/\">&lt;sub&gt;/</a><br>\n"));
    }

    #[test]
    fn error_pages() {
        assert_eq!(
            error_page(StatusCode::NOT_FOUND),
            "<html><head><title>404 Not Found</title></head><body><h1>Not Found</h1></body></html>"
        );
        assert!(error_page(StatusCode::URI_TOO_LONG).contains("<title>414 URI Too Long</title>"));
        assert!(
            error_page(StatusCode::METHOD_NOT_ALLOWED)
                .contains("<h1>Method Not Allowed</h1>")
        );
    }

    #[test]
    fn extensions() {
        assert_eq!(extension(Path::new("/srv/a/song.MP3")), "MP3");
        assert_eq!(extension(Path::new("/srv/a/archive.tar.gz")), "gz");
        assert_eq!(extension(Path::new("/srv/a/.htaccess")), "htaccess");
        assert_eq!(extension(Path::new("/srv/a.d/README")), "");
        assert_eq!(extension(Path::new("/srv/a/trailing.")), "");
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<a href='x'>&\""), "&lt;a href=&#39;x&#39;&gt;&amp;&quot;");
    }
}
