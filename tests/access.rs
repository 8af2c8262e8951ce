use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;
use xxindex::{
    AccessOptions, BomDetector, ByteBounds, Extractor, ExtractorOptions, IndexElement, IndexOptions, MemorySource,
    XmlElement, XpathAccess, XxIndexError,
};

const SAMPLE: &[u8] = b"<a><b>1</b><c/></a>";

const FEED: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<feed xmlns:dc=\"http://purl.org/dc/elements/1.1/\">
  <entry id=\"1\">
    <dc:title>First</dc:title>
  </entry>
  <!-- <entry id=\"ignored\"> -->
  <entry id=\"2\" note=\"a > b\">
    <dc:title><![CDATA[Second </entry>]]></dc:title>
  </entry>
</feed>
";

fn write_fixture(suffix: &str, bytes: &[u8]) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create fixture");
    file.write_all(bytes).expect("write fixture");
    file.flush().expect("flush fixture");
    file
}

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).expect("compress");
    encoder.finish().expect("finish gzip")
}

fn open(bytes: &[u8]) -> (NamedTempFile, XpathAccess) {
    let file = write_fixture(".xml", bytes);
    let access = XpathAccess::open(file.path(), AccessOptions::default()).expect("open fixture");
    (file, access)
}

#[test]
fn sample_document_round_trips() {
    let (_file, access) = open(SAMPLE);

    assert_eq!(access.xml_snippets("/a/b", None).unwrap(), vec!["<b>1</b>"]);
    assert_eq!(access.xml_snippets("/a/c", None).unwrap(), vec!["<c/>"]);
    assert_eq!(access.xml_snippets("/a", None).unwrap(), vec!["<a><b>1</b><c/></a>"]);
    assert_eq!(access.index().checksum(), "75034f1dc4f75592e92be193a002ec1f");
}

#[test]
fn bounds_restrict_the_result() {
    let (_file, access) = open(SAMPLE);
    let bounds = Some(ByteBounds::new(3, 11));

    assert_eq!(access.xml_snippets("/a/b", bounds).unwrap(), vec!["<b>1</b>"]);
    assert!(access.xml_snippets("/a/c", bounds).unwrap().is_empty());
    assert!(access.xml_snippets("/a", bounds).unwrap().is_empty());

    let inside_a = ByteBounds::within(&access.index().elements("/a")[0]);
    assert_eq!(access.snippet_iter("/a/c", Some(inside_a)).count(), 1);
}

#[test]
fn unknown_xpath_is_empty_not_an_error() {
    let (_file, access) = open(SAMPLE);
    assert_eq!(access.element_count("/a/zzz"), None);
    assert!(access.xml_snippets("/a/zzz", None).unwrap().is_empty());
    assert!(access.xml_elements("/a/zzz", None).unwrap().is_empty());
}

#[test]
fn feed_entries_skip_comments_and_cdata() {
    let (_file, access) = open(FEED);

    assert_eq!(access.element_count("/feed/entry"), Some(2));
    assert_eq!(access.element_count("/feed/entry/title"), Some(2));

    let entries = access.xml_elements("/feed/entry", None).unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].line, Some(3));
    assert_eq!(entries[1].line, Some(7));
    assert!(entries[0].snippet.starts_with("<entry id=\"1\">"));
    assert!(entries[1].snippet.contains("<![CDATA[Second </entry>]]>"));
    assert!(entries[1].snippet.ends_with("</entry>"));

    let titles = access.xml_snippets("/feed/entry/title/", None).unwrap();
    assert_eq!(titles[0], "<dc:title>First</dc:title>");
}

#[test]
fn start_tags_are_read_alone() {
    let (_file, access) = open(FEED);
    let second = access.index().elements("/feed/entry")[1];

    assert_eq!(
        access.start_tag(&second).unwrap().as_deref(),
        Some("<entry id=\"2\" note=\"a > b\">")
    );
    let root = access.index().elements("/feed")[0];
    assert_eq!(
        access.start_tag(&root).unwrap().as_deref(),
        Some("<feed xmlns:dc=\"http://purl.org/dc/elements/1.1/\">")
    );
}

#[test]
fn inclusion_set_keeps_offsets_and_drops_the_rest() {
    let (_file, full) = open(FEED);
    let file = write_fixture(".xml", FEED);
    let options = AccessOptions::new(
        IndexOptions::default().with_inclusion_set(["/feed/entry/"]),
        ExtractorOptions::default(),
    );
    let restricted = XpathAccess::open(file.path(), options).unwrap();

    assert_eq!(restricted.index().keys().collect::<Vec<_>>(), vec!["/feed/entry"]);
    assert_eq!(restricted.index().elements("/feed/entry"), full.index().elements("/feed/entry"));
    assert_eq!(restricted.element_count("/feed"), None);
}

#[test]
fn prefixes_are_kept_on_request() {
    let file = write_fixture(".xml", FEED);
    let options = AccessOptions::new(
        IndexOptions::default().with_namespace_prefix_stripping(false),
        ExtractorOptions::default(),
    );
    let access = XpathAccess::open(file.path(), options).unwrap();
    assert_eq!(access.element_count("/feed/entry/dc:title"), Some(2));
    assert_eq!(access.element_count("/feed/entry/title"), None);
}

#[test]
fn gzip_files_index_decompressed_offsets() {
    let file = write_fixture(".xml.gz", &gzip(FEED));
    let (_plain_file, plain) = open(FEED);
    let access = XpathAccess::open(file.path(), AccessOptions::default()).unwrap();

    assert_eq!(access.index().checksum(), plain.index().checksum());
    assert_eq!(
        access.xml_snippets("/feed/entry", None).unwrap(),
        plain.xml_snippets("/feed/entry", None).unwrap()
    );
    let second = access.index().elements("/feed/entry")[1];
    assert_eq!(
        access.start_tag(&second).unwrap().as_deref(),
        Some("<entry id=\"2\" note=\"a > b\">")
    );
}

#[test]
fn plain_file_named_gz_is_rejected() {
    let file = write_fixture(".xml.gz", SAMPLE);
    let err = XpathAccess::open(file.path(), AccessOptions::default()).unwrap_err();
    assert!(matches!(err, XxIndexError::SourceFormatMismatch(_)), "{:?}", err);
}

#[test]
fn declared_encoding_is_used_for_decoding() {
    let (_file, access) = open(b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r><e>caf\xE9</e></r>");
    assert_eq!(access.extractor().encoding(), encoding_rs::WINDOWS_1252);
    assert_eq!(access.xml_snippets("/r/e", None).unwrap(), vec!["<e>café</e>"]);
}

#[test]
fn configured_encoding_beats_the_declaration_unless_detection_is_preferred() {
    let xml = b"<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?><r><e>caf\xE9</e></r>";
    let file = write_fixture(".xml", xml);

    let configured = AccessOptions::new(IndexOptions::default(), ExtractorOptions::default().with_encoding("UTF-8"));
    let access = XpathAccess::open(file.path(), configured).unwrap();
    assert_eq!(access.extractor().encoding(), encoding_rs::UTF_8);
    assert_eq!(access.xml_snippets("/r/e", None).unwrap(), vec!["<e>caf\u{FFFD}</e>"]);

    let preferred = AccessOptions::new(
        IndexOptions::default(),
        ExtractorOptions::default().with_encoding("UTF-8").with_prefer_detected(true),
    );
    let access = XpathAccess::open(file.path(), preferred).unwrap();
    assert_eq!(access.extractor().encoding(), encoding_rs::WINDOWS_1252);
}

#[test]
fn unknown_encodings_are_reported() {
    let file = write_fixture(".xml", b"<?xml version=\"1.0\" encoding=\"klingon-8\"?><r/>");
    let err = XpathAccess::open(file.path(), AccessOptions::default()).unwrap_err();
    assert!(matches!(err, XxIndexError::UnknownEncoding(ref label) if label == "klingon-8"));

    let file = write_fixture(".xml", SAMPLE);
    let options = AccessOptions::new(IndexOptions::default(), ExtractorOptions::default().with_encoding("nope"));
    let err = XpathAccess::open(file.path(), options).unwrap_err();
    assert!(matches!(err, XxIndexError::UnknownEncoding(_)));
}

#[test]
fn structural_errors_abort_the_open() {
    let file = write_fixture(".xml", b"<a>\n<b></a>");
    let err = XpathAccess::open(file.path(), AccessOptions::default()).unwrap_err();
    assert!(err.is_structural());
    assert!(err.to_string().contains("line 2"));
}

#[test]
fn utf16_like_filler_is_stripped_from_snippets() {
    let padded: Vec<u8> = b"<a>\n<b>x</b></a>".iter().flat_map(|&b| [b, 0]).collect();
    let access = XpathAccess::from_source(MemorySource::new(padded), AccessOptions::default()).unwrap();

    assert_eq!(access.index().elements("/a/b"), &[IndexElement::new(8, 23, Some(2))]);
    assert_eq!(
        access.xml_elements("/a/b", None).unwrap(),
        vec![XmlElement {
            snippet: "<b>x</b>".to_string(),
            line: Some(2)
        }]
    );
}

#[test]
fn custom_detector_is_used_for_the_source() {
    let xml = b"\xEF\xBB\xBF<r><e>\xC3\xA9</e></r>".to_vec();
    let options = AccessOptions::new(IndexOptions::default(), ExtractorOptions::default().with_encoding("windows-1252"));
    let access = XpathAccess::with_detector(MemorySource::new(xml), options, Box::new(BomDetector)).unwrap();
    // Configured encoding wins over the BOM without prefer_detected.
    assert_eq!(access.extractor().encoding(), encoding_rs::WINDOWS_1252);
    assert_eq!(access.xml_snippets("/r/e", None).unwrap(), vec!["<e>Ã©</e>"]);
}

#[test]
fn range_errors_surface_from_the_extractor() {
    let extractor = Extractor::new(MemorySource::new(SAMPLE.to_vec()));
    assert!(matches!(
        extractor.read_range(11, 3),
        Err(XxIndexError::InvalidRange { start: 11, stop: 3 })
    ));
    assert!(matches!(
        extractor.read_range(0, u64::MAX),
        Err(XxIndexError::RangeTooLarge { .. })
    ));
    assert_eq!(
        extractor.read_element(&IndexElement::new(11, 15, Some(1))).unwrap(),
        "<c/>"
    );
}

#[test]
fn lines_can_be_left_out() {
    let file = write_fixture(".xml", FEED);
    let options = AccessOptions::new(IndexOptions::default().with_line_numbers(false), ExtractorOptions::default());
    let access = XpathAccess::open(file.path(), options).unwrap();
    assert!(!access.index().records_line_numbers());
    assert!(access
        .xml_elements("/feed/entry", None)
        .unwrap()
        .iter()
        .all(|element| element.line.is_none()));
}
