use std::cell::RefCell;
use std::io::{Cursor, Write};
use std::rc::Rc;

use epubedit::html::{TagTable, Tokenizer, to_html};
use epubedit::{Diagnostics, DocumentError, DocumentSet, EpubContainer, EpubError, Item, StyleMap, Type};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

const CONTAINER_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<container version="1.0" xmlns="urn:oasis:names:tc:opendocument:xmlns:container">
  <rootfiles>
    <rootfile full-path="OEBPS/content.opf" media-type="application/oebps-package+xml"/>
  </rootfiles>
</container>"#;

const CONTENT_OPF: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<package version="2.0" xmlns="http://www.idpf.org/2007/opf">
  <metadata xmlns:dc="http://purl.org/dc/elements/1.1/">
    <dc:title>Pipeline</dc:title>
    <dc:creator>A</dc:creator>
    <dc:creator>B</dc:creator>
  </metadata>
  <manifest>
    <item id="chap1" href="chap1.xhtml" media-type="application/xhtml+xml"/>
    <item id="css1" href="style.css" media-type="text/css"/>
  </manifest>
  <spine>
    <itemref idref="chap1"/>
  </spine>
</package>"#;

const TOC_NCX: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head><meta name="dtb:uid" content="id-1"/></head>
  <docTitle><text>Pipeline</text></docTitle>
  <navMap>
    <navPoint id="n2" playOrder="2"><navLabel><text>Two</text></navLabel><content src="OEBPS/chap1.xhtml#two"/></navPoint>
    <navPoint id="n1" playOrder="1"><navLabel><text>One</text></navLabel><content src="OEBPS/chap1.xhtml"/></navPoint>
  </navMap>
</ncx>"#;

fn build_epub(entries: &[(&str, &str)]) -> Cursor<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data.as_bytes()).unwrap();
    }
    Cursor::new(writer.finish().unwrap().into_inner())
}

fn full_entries() -> Vec<(&'static str, &'static str)> {
    vec![
        ("mimetype", "application/epub+zip"),
        ("META-INF/container.xml", CONTAINER_XML),
        ("OEBPS/content.opf", CONTENT_OPF),
        ("OEBPS/chap1.xhtml", "<html><body><p>Hello <b>world</b></p></body></html>"),
        ("OEBPS/style.css", "p { margin: 0 }"),
        ("toc.ncx", TOC_NCX),
    ]
}

fn tokenize(markup: &str) -> Vec<Item> {
    let mut diagnostics = Diagnostics::new();
    Tokenizer::new(TagTable::default_table())
        .tokenize(markup, &mut diagnostics)
        .unwrap()
}

fn typed_text(items: &[Item]) -> Vec<(Type, String)> {
    items
        .iter()
        .map(|item| (item.kind(), item.rendered_text().into_owned()))
        .collect()
}

#[test]
fn missing_mimetype_fails_with_one_fatal() {
    let entries: Vec<_> = full_entries()
        .into_iter()
        .filter(|(name, _)| *name != "mimetype")
        .collect();
    let mut diagnostics = Diagnostics::new();
    let result = EpubContainer::from_reader(build_epub(&entries), "book.epub", &mut diagnostics);

    assert!(matches!(result, Err(EpubError::MissingMimetype)));
    assert_eq!(diagnostics.fatals().count(), 1);
}

#[test]
fn container_resolves_package_and_partitions_manifest() {
    let mut diagnostics = Diagnostics::new();
    let epub = EpubContainer::from_reader(build_epub(&full_entries()), "book.epub", &mut diagnostics).unwrap();

    assert_eq!(epub.ordered_items(), ["chap1"]);
    assert_eq!(epub.item("chap1").unwrap().path, "OEBPS/chap1.xhtml");
    assert_eq!(epub.item("css1").unwrap().path, "OEBPS/style.css");
    // 只有正文文档类型会进入无序集合
    assert_eq!(epub.unordered_items().count(), 0);
    assert_eq!(epub.metadata("creator"), Some("A; B"));
    assert!(!diagnostics.has_fatal());
}

#[test]
fn toc_orders_nav_points_by_play_order() {
    let mut diagnostics = Diagnostics::new();
    let epub = EpubContainer::from_reader(build_epub(&full_entries()), "book.epub", &mut diagnostics).unwrap();

    let toc = epub.toc();
    assert_eq!(toc.navmap.len(), 2);
    let orders: Vec<i32> = toc.navmap.keys().copied().collect();
    assert_eq!(orders, vec![1, 2]);
    assert_eq!(toc.navmap[&1].label, "One");
    assert_eq!(toc.title, "Pipeline");
}

#[test]
fn paragraph_tokenizes_to_expected_items() {
    let mut documents = DocumentSet::new();
    let mut diagnostics = Diagnostics::new();
    documents
        .parse("chap1", "<p>Hello <b>world</b></p>", StyleMap::new(), &mut diagnostics)
        .unwrap();

    let page = documents.page("chap1").unwrap();
    assert_eq!(
        typed_text(page.items()),
        vec![
            (Type::P, String::new()),
            (Type::Word, "Hello".to_string()),
            (Type::B, String::new()),
            (Type::Word, "world".to_string()),
            (Type::B, String::new()),
            (Type::P, String::new()),
        ]
    );
    assert!(matches!(page.items()[0], Item::OpenTag(_)));
    assert!(matches!(page.items()[4], Item::EndTag { .. }));
    assert_eq!(documents.word_list(), ["Hello", "world"]);
}

#[test]
fn tokenize_serialize_round_trip() {
    let samples = [
        "<p>Hello <b>world</b></p>",
        "<html><head><title>T</title><style>p{x:1}</style></head><body><h1>A &amp; B</h1></body></html>",
        "<div class=\"c\"><ul><li>one, two</li><li>three&#8230;</li></ul><hr/><img src=\"a.png\" alt=\"&lt;a&gt;\"/></div>",
        "<table><tr><td> padded </td><td>x-ray's</td></tr></table>",
        "<p>line<br>break<br/>again</p>",
    ];

    for markup in samples {
        let first = tokenize(markup);
        let html = to_html(&first, &StyleMap::new());
        let second = tokenize(&html);
        assert_eq!(typed_text(&first), typed_text(&second), "往返不一致: {}", markup);
    }
}

#[test]
fn mutations_keep_balance_or_reject() {
    let mut documents = DocumentSet::new();
    let mut diagnostics = Diagnostics::new();
    documents
        .parse("a", "<div><p>one <em>two</em></p><p>three</p></div>", StyleMap::new(), &mut diagnostics)
        .unwrap();

    let candidates = [
        vec![Item::open(Type::B)],
        vec![Item::end(Type::P)],
        vec![Item::open(Type::I), Item::word("x"), Item::end(Type::I)],
        vec![Item::word("y")],
        vec![Item::open(Type::Br)],
    ];

    for index in 0..=documents.total_len() {
        for candidate in &candidates {
            let before = documents.html_by_id("a").unwrap().to_string();
            let len = documents.total_len();
            match documents.insert(index.min(len), candidate.clone()) {
                Ok(()) => {
                    assert_eq!(epubedit::html::balance_violation(documents.page("a").unwrap().items()), None);
                    assert_eq!(documents.total_len(), len + candidate.len());
                }
                Err(DocumentError::Unbalanced { .. }) => {
                    assert_eq!(documents.html_by_id("a").unwrap(), before);
                    assert_eq!(documents.total_len(), len);
                }
                Err(other) => panic!("意外的错误 {:?}", other),
            }
        }
    }

    while documents.total_len() > 0 {
        let len = documents.total_len();
        let removable = (0..len).find(|&i| documents.stays_balanced_without(i));
        match removable {
            Some(index) => {
                documents.remove_at(index).unwrap();
            }
            None => break,
        }
        assert_eq!(epubedit::html::balance_violation(documents.page("a").unwrap().items()), None);
    }
}

/// 删除单个项目后仍然平衡的判断
trait RemovalCheck {
    fn stays_balanced_without(&self, index: usize) -> bool;
}

impl RemovalCheck for DocumentSet {
    fn stays_balanced_without(&self, index: usize) -> bool {
        let mut items: Vec<Item> = self.iter().cloned().collect();
        items.remove(index);
        epubedit::html::balance_violation(&items).is_none()
    }
}

type Removals = Rc<RefCell<Vec<(usize, Vec<String>)>>>;

fn recording_document(markup: &str) -> (DocumentSet, Removals) {
    let mut documents = DocumentSet::new();
    let mut diagnostics = Diagnostics::new();
    documents.parse("p", markup, StyleMap::new(), &mut diagnostics).unwrap();

    let removals: Removals = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&removals);
    documents.set_removal_listener(move |index, items| {
        let texts = items.iter().map(|item| item.to_html(&StyleMap::new())).collect();
        sink.borrow_mut().push((index, texts));
    });
    (documents, removals)
}

#[test]
fn index_of_then_remove_at_matches_remove() {
    let markup = "<p>alpha <i>beta</i> gamma delta beta</p>";
    let targets = [
        vec![Item::word("beta")],
        vec![Item::word("gamma"), Item::word("delta")],
    ];

    for target in &targets {
        let (mut by_content, removals) = recording_document(markup);
        let (mut by_index, _) = recording_document(markup);

        let removed_at = by_content.remove(target).unwrap();

        let index = by_index.index_of(target).unwrap();
        assert_eq!(index, removed_at);
        let mut removed = Vec::new();
        for _ in 0..target.len() {
            removed.push(by_index.remove_at(index).unwrap().to_html(&StyleMap::new()));
        }

        assert_eq!(by_content.html_by_id("p").unwrap(), by_index.html_by_id("p").unwrap());
        assert_eq!(by_content.word_list(), by_index.word_list());
        assert_eq!(removals.borrow().as_slice(), &[(index, removed)]);
    }
}

#[test]
fn lone_tag_removal_is_rejected_but_group_removal_succeeds() {
    let (mut documents, removals) = recording_document("<p>alpha <i>beta</i> gamma</p>");
    let group = vec![Item::open(Type::I), Item::word("beta"), Item::end(Type::I)];
    let index = documents.index_of(&group).unwrap();
    let before = documents.html_by_id("p").unwrap().to_string();

    assert!(matches!(documents.remove_at(index), Err(DocumentError::Unbalanced { .. })));
    assert!(matches!(documents.remove_at(index + 2), Err(DocumentError::Unbalanced { .. })));
    assert_eq!(documents.html_by_id("p").unwrap(), before);

    assert_eq!(documents.remove(&group), Ok(index));
    // 单独的空格字符留在原处
    assert_eq!(documents.html_by_id("p").unwrap(), "<p>alpha  gamma</p>");
    assert_eq!(documents.word_list(), ["alpha", "gamma"]);
    assert_eq!(removals.borrow().len(), 1);
    assert_eq!(removals.borrow()[0].1, vec!["<i>", "beta", "</i>"]);
}

#[test]
fn pipeline_loads_documents_from_package() {
    let mut diagnostics = Diagnostics::new();
    let mut epub = EpubContainer::from_reader(build_epub(&full_entries()), "book.epub", &mut diagnostics).unwrap();
    let mut documents = DocumentSet::new();
    let loaded = epub.load_documents(&mut documents, &epubedit::HtmlNormalizer, &mut diagnostics);

    assert_eq!(loaded, 1);
    assert_eq!(documents.word_list(), ["Hello", "world"]);
    assert!(documents.html_by_id("chap1").unwrap().contains("<p>Hello <b>world</b></p>"));
}
