//! EPUB adapter: unpacks the archive, walks the spine in reading order, and
//! strips each XHTML content document down to plain text.
//!
//! Supports EPUB 2 and EPUB 3. Chapter titles come from the NCX table of
//! contents where available, then from the document's first heading, then
//! from a numbered fallback.

use quick_xml::Reader;
use quick_xml::events::Event;
use std::collections::HashMap;
use std::io::{Read, Seek};
use std::path::Path;
use zip::ZipArchive;

use super::stem_title;
use crate::document::{LoadedDocument, RawChapter};
use crate::error::{Error, Result};

/// Parsed OPF content
struct OpfData {
    title: String,
    author: Option<String>,
    /// Maps manifest id -> (href, media_type)
    manifest: HashMap<String, (String, String)>,
    spine_ids: Vec<String>,
    ncx_href: Option<String>,
}

/// Read an EPUB file from disk.
pub fn read_epub(path: &Path) -> Result<LoadedDocument> {
    let file = std::fs::File::open(path)?;
    let mut doc = read_epub_from_reader(file)?;
    if doc.title.is_empty() {
        doc.title = stem_title(path);
    }
    Ok(doc)
}

/// Read an EPUB from any [`Read`] + [`Seek`] source, such as a memory buffer.
pub fn read_epub_from_reader<R: Read + Seek>(reader: R) -> Result<LoadedDocument> {
    let mut archive = ZipArchive::new(reader)?;

    // 1. Find the OPF file path from container.xml
    let opf_path = find_opf_path(&mut archive)?;
    let opf_dir = Path::new(&opf_path)
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_default();

    // 2. Parse the OPF file
    let opf_content = read_archive_file(&mut archive, &opf_path)?;
    let opf = parse_opf(&opf_content)?;

    // 3. NCX labels give chapters their titles where available
    let mut toc_titles = HashMap::new();
    if let Some(ref ncx_href) = opf.ncx_href {
        let ncx_path = resolve_path(&opf_dir, ncx_href);
        if let Ok(ncx_content) = read_archive_file(&mut archive, &ncx_path) {
            toc_titles = parse_ncx_titles(&ncx_content)?;
        }
    }

    // 4. Walk the spine in reading order, stripping each content document
    let mut chapters = Vec::new();
    for id in &opf.spine_ids {
        let Some((href, media_type)) = opf.manifest.get(id) else {
            continue;
        };
        if !is_content_document(href, media_type) || is_auxiliary(href) {
            continue;
        }
        let full_path = resolve_path(&opf_dir, href);
        let Ok(html) = read_archive_file(&mut archive, &full_path) else {
            log::warn!("skipping unreadable spine item {full_path}");
            continue;
        };
        let (heading, body) = extract_text(&html)?;
        let title = toc_titles
            .get(href.as_str())
            .cloned()
            .or(heading)
            .unwrap_or_else(|| format!("Chapter {}", chapters.len() + 1));
        chapters.push(RawChapter::new(title, body));
    }

    Ok(LoadedDocument {
        title: opf.title,
        author: opf.author,
        chapters,
    })
}

fn find_opf_path<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String> {
    let container = read_archive_file(archive, "META-INF/container.xml")?;

    let mut reader = Reader::from_str(&container);
    reader.config_mut().trim_text(true);

    loop {
        match reader.read_event() {
            Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"rootfile" => {
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"full-path" {
                        return Ok(String::from_utf8(attr.value.to_vec())?);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Err(Error::InvalidEpub(
        "No rootfile found in container.xml".into(),
    ))
}

fn parse_opf(content: &str) -> Result<OpfData> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut title = String::new();
    let mut author: Option<String> = None;
    let mut manifest: HashMap<String, (String, String)> = HashMap::new();
    let mut spine_ids: Vec<String> = Vec::new();
    let mut toc_id: Option<String> = None;

    let mut in_metadata = false;
    let mut current_element: Option<String> = None;
    let mut buf_text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"metadata" => in_metadata = true,
                    b"title" | b"creator" => {
                        if in_metadata {
                            current_element = Some(String::from_utf8_lossy(local).to_string());
                            buf_text.clear();
                        }
                    }
                    b"spine" => {
                        // Get toc attribute for NCX reference
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"toc" {
                                toc_id = Some(String::from_utf8(attr.value.to_vec())?);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                match local {
                    b"item" => {
                        let mut id = String::new();
                        let mut href = String::new();
                        let mut media_type = String::new();

                        for attr in e.attributes().flatten() {
                            match attr.key.as_ref() {
                                b"id" => id = String::from_utf8(attr.value.to_vec())?,
                                b"href" => href = String::from_utf8(attr.value.to_vec())?,
                                b"media-type" => {
                                    media_type = String::from_utf8(attr.value.to_vec())?
                                }
                                _ => {}
                            }
                        }

                        if !id.is_empty() {
                            manifest.insert(id, (href, media_type));
                        }
                    }
                    b"itemref" => {
                        for attr in e.attributes().flatten() {
                            if attr.key.as_ref() == b"idref" {
                                spine_ids.push(String::from_utf8(attr.value.to_vec())?);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(e)) => {
                if current_element.is_some() {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    buf_text.push_str(&raw);
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if current_element.is_some() {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        buf_text.push(resolved);
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());

                if local == b"metadata" {
                    in_metadata = false;
                }

                if let Some(ref elem) = current_element {
                    match elem.as_str() {
                        "title" => {
                            if title.is_empty() {
                                title = buf_text.clone();
                            }
                        }
                        "creator" => {
                            if author.is_none() && !buf_text.trim().is_empty() {
                                author = Some(buf_text.clone());
                            }
                        }
                        _ => {}
                    }
                    current_element = None;
                    buf_text.clear();
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    let ncx_href = toc_id
        .and_then(|id| manifest.get(&id))
        .map(|(href, _)| href.clone());

    Ok(OpfData {
        title,
        author,
        manifest,
        spine_ids,
        ncx_href,
    })
}

/// Flatten the NCX navMap into a content-href -> label map. Fragment parts of
/// src attributes are dropped so the keys match manifest hrefs.
fn parse_ncx_titles(content: &str) -> Result<HashMap<String, String>> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut titles: HashMap<String, String> = HashMap::new();
    let mut text: Option<String> = None;
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                match local {
                    b"navPoint" => text = None,
                    b"text" => in_text = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(e)) => {
                let name = e.name();
                if local_name(name.as_ref()) == b"content" {
                    for attr in e.attributes().flatten() {
                        if attr.key.as_ref() == b"src"
                            && let Some(label) = text.clone()
                        {
                            let src = String::from_utf8(attr.value.to_vec())?;
                            let href = src.split('#').next().unwrap_or(&src).to_string();
                            // First navPoint for a document wins.
                            titles.entry(href).or_insert(label);
                        }
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if in_text {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    match &mut text {
                        Some(existing) => existing.push_str(&raw),
                        None => text = Some(raw.into_owned()),
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if in_text {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        match &mut text {
                            Some(existing) => existing.push(resolved),
                            None => text = Some(resolved.to_string()),
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                if local_name(e.name().as_ref()) == b"text" {
                    in_text = false;
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok(titles)
}

/// Strip an XHTML content document to plain text.
///
/// Returns the first heading's text (a chapter-title candidate) and the body:
/// block elements force line breaks, paragraph-level elements a blank line,
/// and whitespace inside text is collapsed the way a renderer would collapse
/// it. head/script/style/svg subtrees are skipped entirely.
fn extract_text(html: &str) -> Result<(Option<String>, String)> {
    // No trim_text here: trimming text events would glue words together
    // across inline tags. Whitespace is normalized in push_text instead.
    let mut reader = Reader::from_str(html);

    let mut out = String::new();
    let mut heading: Option<String> = None;
    let mut heading_buf: Option<String> = None;
    let mut skip_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if is_skipped(local) {
                    skip_depth += 1;
                } else if skip_depth == 0 {
                    if is_block(local) {
                        ensure_newline(&mut out);
                    }
                    if heading.is_none()
                        && heading_buf.is_none()
                        && matches!(local, b"h1" | b"h2" | b"h3")
                    {
                        heading_buf = Some(String::new());
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if skip_depth == 0 {
                    let name = e.name();
                    let local = local_name(name.as_ref());
                    if local == b"br" || local == b"hr" {
                        ensure_newline(&mut out);
                    }
                }
            }
            Ok(Event::Text(e)) => {
                if skip_depth == 0 {
                    let raw = String::from_utf8_lossy(e.as_ref());
                    push_text(&mut out, &raw);
                    if let Some(buf) = heading_buf.as_mut() {
                        push_text(buf, &raw);
                    }
                }
            }
            Ok(Event::GeneralRef(e)) => {
                if skip_depth == 0 {
                    let entity = String::from_utf8_lossy(e.as_ref());
                    if let Some(resolved) = resolve_entity(&entity) {
                        out.push(resolved);
                        if let Some(buf) = heading_buf.as_mut() {
                            buf.push(resolved);
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                let name = e.name();
                let local = local_name(name.as_ref());
                if is_skipped(local) {
                    skip_depth = skip_depth.saturating_sub(1);
                } else if skip_depth == 0 {
                    if matches!(local, b"h1" | b"h2" | b"h3")
                        && let Some(buf) = heading_buf.take()
                    {
                        let label = buf.trim();
                        if !label.is_empty() {
                            heading = Some(label.to_string());
                        }
                    }
                    if is_paragraph(local) {
                        ensure_blank_line(&mut out);
                    } else if is_block(local) {
                        ensure_newline(&mut out);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(Error::Xml(e)),
            _ => {}
        }
    }

    Ok((heading, out))
}

/// Append text with renderer-style whitespace collapsing: internal runs
/// become single spaces, boundary whitespace becomes at most one space.
fn push_text(out: &mut String, text: &str) {
    let has_leading = text.starts_with(char::is_whitespace);
    let has_trailing = text.ends_with(char::is_whitespace);
    let words: Vec<&str> = text.split_whitespace().collect();

    if words.is_empty() {
        if !text.is_empty() && !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }

    if has_leading && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(&words.join(" "));
    if has_trailing {
        out.push(' ');
    }
}

fn ensure_newline(out: &mut String) {
    while out.ends_with(' ') {
        out.pop();
    }
    if !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
}

fn ensure_blank_line(out: &mut String) {
    ensure_newline(out);
    if !out.is_empty() && !out.ends_with("\n\n") {
        out.push('\n');
    }
}

fn is_skipped(local: &[u8]) -> bool {
    matches!(local, b"head" | b"script" | b"style" | b"svg")
}

fn is_paragraph(local: &[u8]) -> bool {
    matches!(
        local,
        b"p" | b"h1"
            | b"h2"
            | b"h3"
            | b"h4"
            | b"h5"
            | b"h6"
            | b"li"
            | b"blockquote"
            | b"pre"
            | b"tr"
    )
}

fn is_block(local: &[u8]) -> bool {
    is_paragraph(local)
        || matches!(
            local,
            b"div"
                | b"ul"
                | b"ol"
                | b"dl"
                | b"dt"
                | b"dd"
                | b"table"
                | b"td"
                | b"th"
                | b"section"
                | b"article"
                | b"aside"
                | b"figure"
                | b"figcaption"
                | b"header"
                | b"footer"
                | b"nav"
                | b"body"
        )
}

/// Resolve a named or numeric entity reference to its character.
fn resolve_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "apos" => Some('\''),
        "quot" => Some('"'),
        "nbsp" => Some(' '),
        _ => {
            let digits = entity.strip_prefix('#')?;
            let code = if let Some(hex) = digits.strip_prefix(['x', 'X']) {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                digits.parse().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Whether a spine item is a readable content document.
fn is_content_document(href: &str, media_type: &str) -> bool {
    let href = href.to_ascii_lowercase();
    media_type.contains("html")
        || href.ends_with(".xhtml")
        || href.ends_with(".html")
        || href.ends_with(".htm")
}

/// Cover and navigation documents are presentation chrome, not chapters.
fn is_auxiliary(href: &str) -> bool {
    let href = href.to_ascii_lowercase();
    ["cover", "nav", "toc", "titlepage"]
        .iter()
        .any(|skip| href.contains(skip))
}

fn read_archive_file<R: Read + Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<String> {
    let bytes = read_archive_file_bytes(archive, path)?;
    // Strip UTF-8 BOM if present
    let bytes = strip_bom(&bytes);
    Ok(String::from_utf8(bytes.to_vec())?)
}

fn read_archive_file_bytes<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
) -> Result<Vec<u8>> {
    // Try direct lookup first
    match archive.by_name(path) {
        Ok(mut file) => {
            let mut contents = Vec::new();
            file.read_to_end(&mut contents)?;
            return Ok(contents);
        }
        Err(zip::result::ZipError::FileNotFound) => {}
        Err(e) => return Err(e.into()),
    }

    // Fallback: try percent-decoded path (handles malformed EPUBs)
    let decoded = percent_encoding::percent_decode_str(path)
        .decode_utf8()
        .map_err(|_| Error::InvalidEpub(format!("Invalid UTF-8 in path: {}", path)))?;

    let mut file = archive.by_name(&decoded)?;
    let mut contents = Vec::new();
    file.read_to_end(&mut contents)?;
    Ok(contents)
}

/// Strip UTF-8 BOM (byte order mark) if present
fn strip_bom(data: &[u8]) -> &[u8] {
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &data[3..]
    } else {
        data
    }
}

fn resolve_path(base: &str, href: &str) -> String {
    if base.is_empty() {
        href.to_string()
    } else {
        format!("{}/{}", base, href)
    }
}

/// Extract local name from potentially namespaced XML name
fn local_name(name: &[u8]) -> &[u8] {
    name.iter()
        .rposition(|&b| b == b':')
        .map(|i| &name[i + 1..])
        .unwrap_or(name)
}
