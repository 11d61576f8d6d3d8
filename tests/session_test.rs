use std::fs;
use std::io::Write;

use folio::import::load_document;
use folio::progress::{ProgressRecord, ProgressStore, file_hash};
use folio::session::Session;
use folio::{Command, Geometry, LoadedDocument, RawChapter};

const CONTAINER_XML: &str = r#"<?xml version="1.0"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const CONTENT_OPF: &str = r#"<?xml version="1.0"?>
<package xmlns="http://www.idpf.org/2007/opf" xmlns:dc="http://purl.org/dc/elements/1.1/" version="2.0">
  <metadata>
    <dc:title>Wild Nights</dc:title>
    <dc:creator>E. Dickinson</dc:creator>
    <dc:language>en</dc:language>
  </metadata>
  <manifest>
    <item id="ch1" href="text/ch1.xhtml" media-type="application/xhtml+xml"/>
    <item id="ch2" href="text/ch2.xhtml" media-type="application/xhtml+xml"/>
    <item id="ncx" href="toc.ncx" media-type="application/x-dtbncx+xml"/>
  </manifest>
  <spine toc="ncx">
    <itemref idref="ch1"/>
    <itemref idref="ch2"/>
  </spine>
</package>"#;

const TOC_NCX: &str = r#"<?xml version="1.0"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <navMap>
    <navPoint id="n1" playOrder="1">
      <navLabel><text>First Night</text></navLabel>
      <content src="text/ch1.xhtml"/>
    </navPoint>
    <navPoint id="n2" playOrder="2">
      <navLabel><text>Second Night</text></navLabel>
      <content src="text/ch2.xhtml"/>
    </navPoint>
  </navMap>
</ncx>"#;

const CH1_XHTML: &str = r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>ch1</title></head>
<body>
<h1>First Night</h1>
<p>Wild nights! Wild nights!</p>
<p>Were I with thee, wild nights should be our luxury.</p>
</body>
</html>"#;

const CH2_XHTML: &str = r#"<?xml version="1.0"?>
<html xmlns="http://www.w3.org/1999/xhtml">
<head><title>ch2</title></head>
<body>
<h1>Second Night</h1>
<p>Futile the winds to a heart in port &#8212; done with the compass.</p>
</body>
</html>"#;

fn build_epub() -> Vec<u8> {
    let mut zip = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();

    let entries = [
        ("mimetype", "application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("OEBPS/content.opf", CONTENT_OPF),
        ("OEBPS/toc.ncx", TOC_NCX),
        ("OEBPS/text/ch1.xhtml", CH1_XHTML),
        ("OEBPS/text/ch2.xhtml", CH2_XHTML),
    ];
    for (name, content) in entries {
        zip.start_file(name, options).expect("start_file");
        zip.write_all(content.as_bytes()).expect("write entry");
    }

    zip.finish().expect("finish").into_inner()
}

#[test]
fn test_epub_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("wild-nights.epub");
    fs::write(&path, build_epub()).unwrap();

    let doc = load_document(&path).expect("load EPUB");
    assert_eq!(doc.title, "Wild Nights");
    assert_eq!(doc.author.as_deref(), Some("E. Dickinson"));
    assert_eq!(doc.chapters.len(), 2);
    assert_eq!(doc.chapters[0].title, "First Night");
    assert_eq!(doc.chapters[1].title, "Second Night");
    assert!(doc.chapters[0].body.contains("Wild nights! Wild nights!"));
    assert!(doc.chapters[1].body.contains("done with the compass"));

    let mut session = Session::new(doc, Geometry::new(30, 4)).expect("session");
    assert_eq!(session.position().page, 0);
    assert!(session.apply(Command::NextChapter));
    let position = session.position();
    assert_eq!(position.chapter, 1);
    assert_eq!(session.chapter_title(), "Second Night");
}

#[test]
fn test_markdown_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    fs::write(&path, "# Alpha\nfirst chapter text\n\n# Beta\nsecond chapter text\n").unwrap();

    let doc = load_document(&path).unwrap();
    assert_eq!(doc.title, "notes");
    assert_eq!(doc.chapters.len(), 2);

    let session = Session::new(doc, Geometry::new(40, 10)).unwrap();
    assert_eq!(session.chapter_count(), 2);
    assert_eq!(session.page_index().page_for_chapter(1).unwrap(), 1);
}

#[test]
fn test_plain_text_with_unknown_encoding() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("latin1.txt");
    // "café au lait" in Latin-1: invalid UTF-8, must fall back rather than fail.
    fs::write(&path, b"caf\xe9 au lait\n").unwrap();

    let doc = load_document(&path).unwrap();
    assert_eq!(doc.chapters.len(), 1);
    assert!(doc.chapters[0].body.contains("café au lait"));
}

#[test]
fn test_progress_round_trip_with_rescale() {
    let dir = tempfile::tempdir().unwrap();
    let book = dir.path().join("book.txt");
    let body: String = (0..200).map(|i| format!("line number {i}\n")).collect();
    fs::write(&book, &body).unwrap();

    let store = ProgressStore::new(dir.path().join("progress.json"));
    let hash = file_hash(&book).unwrap();

    // First run: 200 lines at one line per page; stop halfway and persist.
    {
        let doc = load_document(&book).unwrap();
        let mut session = Session::new(doc, Geometry::new(40, 1)).unwrap();
        assert_eq!(session.total_pages(), 200);
        session.start_at_page(50).unwrap();
        let position = session.position();
        store
            .save(ProgressRecord::new(
                hash.clone(),
                "book.txt",
                position,
                session.total_pages(),
            ))
            .unwrap();
    }

    // Second run under a taller terminal: half as many pages. The restored
    // position rescales to the same relative spot instead of clamping.
    {
        let doc = load_document(&book).unwrap();
        let mut session = Session::new(doc, Geometry::new(40, 2)).unwrap();
        assert_eq!(session.total_pages(), 100);

        let record = store.load(&hash).expect("saved progress");
        assert_eq!(record.page_index, 50);
        assert_eq!(record.total_pages, 200);

        session.restore(record.page_index, record.total_pages);
        assert_eq!(session.position().page, 25);
    }
}

#[test]
fn test_restore_scenario_from_unchanged_geometry() {
    let chapters = vec![RawChapter::new(
        "One",
        (0..30).map(|i| format!("{i}\n")).collect::<String>(),
    )];
    let loaded = LoadedDocument {
        title: "t".into(),
        author: None,
        chapters,
    };
    let mut session = Session::new(loaded, Geometry::new(10, 3)).unwrap();
    let total = session.total_pages();

    session.restore(4, total);
    assert_eq!(session.position().page, 4);
}
