use clap::Parser;
use epubedit::html::{DEFAULT_CONFIG_PATH, to_pretty_html};
use epubedit::{Diagnostics, DocumentSet, EpubContainer, HtmlNormalizer, Item, ReferenceType, Result, TagTable};

/// 📚 epubedit - EPUB解析与文档模型工具
#[derive(Parser)]
#[command(name = "epubedit")]
#[command(about = "解析EPUB包并构建可编辑的文档模型")]
#[command(version)]
struct Args {
    /// EPUB文件路径
    #[arg(help = "要处理的EPUB文件路径")]
    epub_file: String,

    /// 详细输出模式
    #[arg(short, long, help = "显示详细信息")]
    verbose: bool,

    /// 显示元数据信息
    #[arg(short, long, help = "显示包文档元数据")]
    metadata: bool,

    /// 显示目录
    #[arg(short, long, help = "显示NCX目录")]
    toc: bool,

    /// 显示清单划分
    #[arg(short, long, help = "显示有序/无序清单项")]
    items: bool,

    /// 显示指定页面
    #[arg(short, long, help = "显示指定清单id的页面HTML")]
    page: Option<String>,

    /// 显示单词表
    #[arg(short, long, help = "显示拼写检查单词表")]
    words: bool,

    /// 标签映射配置
    #[arg(long, help = "标签映射配置文件（不存在时生成默认配置）")]
    tags: Option<String>,
}

fn main() {
    let args = Args::parse();

    println!("📚 epubedit {} - {}", epubedit::VERSION, epubedit::DESCRIPTION);
    println!("正在打开EPUB文件: {}", args.epub_file);

    let mut diagnostics = Diagnostics::new();
    let result = process_epub(&args, &mut diagnostics);

    if !diagnostics.is_empty() {
        println!("\n🩺 诊断信息 ({} 条):", diagnostics.len());
        for diagnostic in diagnostics.entries() {
            println!("  {}", diagnostic);
        }
    }

    match result {
        Ok(()) => println!("🎉 EPUB文件处理完成！"),
        Err(e) => {
            eprintln!("❌ 错误: {}", e);
            std::process::exit(1);
        }
    }
}

fn process_epub(args: &Args, diagnostics: &mut Diagnostics) -> Result<()> {
    let mut epub = EpubContainer::open(&args.epub_file, diagnostics)?;

    println!("\n📁 EPUB文件内容 ({}):", epub.archive_name());
    let entries = epub.list_entries();
    if args.verbose {
        for (i, entry) in entries.iter().enumerate() {
            println!("  {}. {}", i + 1, entry);
        }
    } else {
        println!("  共找到 {} 个文件", entries.len());
    }
    println!("  📚 包文档路径: {}", epub.package().path);

    if args.metadata {
        display_metadata(&epub);
    }

    if args.toc {
        display_toc(&epub, args.verbose);
    }

    if args.items {
        display_items(&epub);
    }

    if args.page.is_some() || args.words {
        let table = match &args.tags {
            Some(path) => TagTable::load_or_default(path),
            None => TagTable::default(),
        };
        if args.verbose {
            let source = args.tags.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
            println!("\n🏷️  标签映射: {} 项（{}）", table.len(), source);
        }

        let mut documents = DocumentSet::with_tag_table(table);
        if args.verbose {
            if let Some(description) = documents.tag_table().description() {
                println!("  {}", description);
            }
        }
        let loaded = epub.load_documents(&mut documents, &HtmlNormalizer, diagnostics);
        println!("\n📖 已载入 {} 个页面，共 {} 个项目", loaded, documents.total_len());

        if let Some(id) = &args.page {
            display_page(&documents, id, args.verbose);
        }
        if args.words {
            display_words(&documents);
        }
    }

    Ok(())
}

/// 显示元数据
fn display_metadata<R: std::io::Read + std::io::Seek>(epub: &EpubContainer<R>) {
    println!("\n📊 EPUB元数据信息:");
    println!("  📖 EPUB版本: {}", epub.package().version);

    for (key, value) in epub.metadata_map() {
        println!("    {}: {}", key, value);
    }

    let attributes = epub.other_meta_tags();
    if !attributes.is_empty() {
        println!("\n  ⚙️  元数据属性:");
        for (name, attrs) in attributes {
            let joined: Vec<String> = attrs.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            println!("    {}: {}", name, joined.join(", "));
        }
    }

    println!("\n  🔖 导引:");
    for kind in ReferenceType::ALL {
        if let Some(reference) = epub.standard_reference(kind) {
            println!("    {}: {} -> {}", kind, reference.title, reference.target);
        }
    }
    for (name, reference) in epub.other_references() {
        println!("    {}: {} -> {}", name, reference.title, reference.target);
    }
}

/// 显示目录
fn display_toc<R: std::io::Read + std::io::Seek>(epub: &EpubContainer<R>, verbose: bool) {
    let toc = epub.toc();
    println!("\n🧭 NCX导航信息:");
    if toc.is_empty() {
        println!("  （没有导航文件）");
        return;
    }

    println!("  📖 NCX版本: {}", toc.version);
    if !toc.xml_lang.is_empty() {
        println!("  🌐 语言: {}", toc.xml_lang);
    }
    if !toc.title.is_empty() {
        println!("  文档标题: {}", toc.title);
    }
    if verbose {
        for (name, content) in &toc.metadata {
            println!("    {}: {}", name, content);
        }
    }

    println!("\n  🗺️  导航点总数: {}", toc.navmap.len());
    for (order, point) in &toc.navmap {
        let indent = "  ".repeat(point.depth + 2);
        if verbose {
            println!("{}{}. {} -> {} [{}]", indent, order, point.label, point.src, point.id);
        } else {
            println!("{}{}. {}", indent, order, point.label);
        }
    }
}

/// 显示清单划分
fn display_items<R: std::io::Read + std::io::Seek>(epub: &EpubContainer<R>) {
    println!("\n📦 清单项: {} 个", epub.items().len());

    println!("  有序（脊柱）:");
    for (i, id) in epub.ordered_items().iter().enumerate() {
        let path = epub.item(id).map(|item| item.path.as_str()).unwrap_or_default();
        let linear = if epub.package().is_linear(id) == Some(false) {
            " [linear=no]"
        } else {
            ""
        };
        println!("    {}. {} -> {}{}", i + 1, id, path, linear);
    }

    println!("  无序:");
    for id in epub.unordered_items() {
        let path = epub.item(id).map(|item| item.path.as_str()).unwrap_or_default();
        println!("    {} -> {}", id, path);
    }
}

/// 显示页面
fn display_page(documents: &DocumentSet, id: &str, verbose: bool) {
    let Some(page) = documents.page(id) else {
        println!("  ❌ 找不到页面: {}", id);
        return;
    };

    println!("\n📄 页面 {}（{} 个项目）:", id, page.len());
    if verbose {
        for (i, item) in page.items().iter().enumerate() {
            println!("  {:>5} {}{}", i, "  ".repeat(item.level()), describe(item));
        }
    }
    println!("{}", "━".repeat(40));
    println!("{}", to_pretty_html(page.items(), page.styles()));
    println!("{}", "━".repeat(40));
}

fn describe(item: &Item) -> String {
    match item {
        Item::OpenTag(tag) => format!("<{}> {:?}", tag.name, item.kind()),
        Item::EndTag { name, .. } => format!("</{}>", name),
        Item::StyleTagContent(content) => format!("[{} 内容 {} 字节]", content.owner, content.text.len()),
        Item::LinkTag(link) => format!("<link> 样式表: {}", link.stylesheet_name.as_deref().unwrap_or("-")),
        Item::Char(c) => format!("字符 {:?}", c.ch),
        Item::Word(w) => format!("单词 {:?}", w.text()),
    }
}

/// 显示单词表
fn display_words(documents: &DocumentSet) {
    let words = documents.word_list();
    println!("\n🔤 单词表: {} 个", words.len());
    println!("  {}", words.join(" "));
}
