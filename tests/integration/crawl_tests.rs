//! Integration tests for the crawler
//!
//! These tests drive full crawls against `ScriptedSession`, an in-memory
//! browser that serves canned navigation markup, and check the artifact
//! tree they produce.

use navpress::browser::ScriptedSession;
use navpress::config::{parse_config, ActiveScopeStrategy, Config};
use navpress::crawler::{analyze_sidebar, dump_sidebar, run_crawl};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use url::Url;

const START: &str = "https://docs.example.com/en/start.htm";

/// Creates a test configuration writing everything under `dir`
fn create_test_config(dir: &Path) -> Config {
    let toml = format!(
        r#"
[site]
start-url = "{}"

[output]
directory = '{}'
hierarchy-log = '{}'
debug-tree = '{}'

[browser]
expansion-timeout-ms = 50
poll-interval-ms = 10
"#,
        START,
        dir.join("out").display(),
        dir.join("hierarchy.txt").display(),
        dir.join("sidebar_debug.json").display(),
    );
    parse_config(&toml).expect("Failed to parse test config")
}

fn nav(sections: &str) -> String {
    format!(
        r#"<html><body>
        <aside class="js-accordion">{}</aside>
        <main><h1>Page</h1><a href="/not-navigation.htm">Body link</a></main>
        </body></html>"#,
        sections
    )
}

fn section(title: &str, links: &str) -> String {
    format!(
        r#"<div class="accordion-section">
            <h4 class="accordion-title">{}</h4>
            <nav class="accordion-content">{}</nav>
        </div>"#,
        title, links
    )
}

/// Printed paths relative to the output directory, with `/` separators
fn relative(config: &Config, paths: &[PathBuf]) -> Vec<String> {
    paths
        .iter()
        .map(|p| {
            p.strip_prefix(&config.output.directory)
                .expect("Artifact outside output directory")
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

#[tokio::test]
async fn test_group_with_two_links() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new().with_page(
        START,
        nav(&section(
            "Guides",
            r#"<a href="/guides/a.htm">A</a><a href="/guides/b.htm">B</a>"#,
        )),
    );

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    let out = &config.output.directory;
    assert!(out.join("001_Guides/001_A.pdf").is_file());
    assert!(out.join("001_Guides/002_B.pdf").is_file());
    assert_eq!(
        outcome.expected.get(&out.join("001_Guides/001_A.pdf")).map(String::as_str),
        Some("https://docs.example.com/guides/a.htm")
    );
    assert_eq!(outcome.report.pages_rendered, 2);
    assert_eq!(outcome.report.directories_created, 1);
    assert!(outcome.report.is_complete());
}

#[tokio::test]
async fn test_lazy_folder_gets_introduction_and_active_children() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let start = nav(&section(
        "Tools",
        r#"<a href="/tools/buffer.htm">Buffer</a>
           <a href="/tools/clip.htm" data-collapsed="true">Clip</a>"#,
    ));
    let clip = nav(
        r#"<div class="accordion-section is-active">
            <h4 class="accordion-title">Tools</h4>
            <nav class="accordion-content">
                <a href="/tools/buffer.htm">Buffer</a>
                <a href="/tools/clip.htm" class="is-active">Clip</a>
                <a href="/tools/clip-raster.htm">Clip Raster</a>
                <a href="/tools/clip-vector.htm">Clip Vector</a>
            </nav>
        </div>"#,
    );
    let mut session = ScriptedSession::new()
        .with_page(START, start)
        .with_page("https://docs.example.com/tools/clip.htm", clip);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Tools/001_Buffer.pdf",
            "001_Tools/002_Clip/000_Introduction.pdf",
            "001_Tools/002_Clip/001_Clip_Raster.pdf",
            "001_Tools/002_Clip/002_Clip_Vector.pdf",
        ]
    );
    assert_eq!(
        outcome
            .expected
            .get(&config.output.directory.join("001_Tools/002_Clip/000_Introduction.pdf"))
            .map(String::as_str),
        Some("https://docs.example.com/tools/clip.htm")
    );
    // The active entry itself is not adopted as its own child
    assert_eq!(outcome.report.active_children, 3);
    assert_eq!(outcome.report.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_lazy_folder_still_collapsed_on_its_own_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let start = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" data-collapsed="true">Clip</a>"#,
    ));
    let clip = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" class="is-active" data-collapsed="true">Clip</a>
           <a href="/tools/clip-raster.htm">Clip Raster</a>"#,
    ));
    let mut session = ScriptedSession::new()
        .with_page(START, start)
        .with_page("https://docs.example.com/tools/clip.htm", clip);

    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_crawl(&mut session, &config),
    )
    .await
    .expect("Crawl did not terminate")
    .unwrap();

    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Tools/001_Clip/000_Introduction.pdf",
            "001_Tools/001_Clip/001_Clip_Raster.pdf",
        ]
    );
    assert!(!config.output.directory.join("001_Tools/001_Clip/001_Clip").exists());
    assert_eq!(outcome.tree[0].children[0].children.len(), 1);
}

#[tokio::test]
async fn test_collapsed_siblings_pointing_back_are_opened_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let start = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" data-collapsed="true">Clip</a>"#,
    ));
    let clip = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" class="is-active" data-collapsed="true">Clip</a>
           <a href="/tools/clip-raster.htm">Clip Raster</a>
           <a href="/tools/clip-vector.htm" data-collapsed="true">Clip Vector</a>"#,
    ));
    let vector = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" data-collapsed="true">Clip</a>
           <a href="/tools/clip-raster.htm">Clip Raster</a>
           <a href="/tools/clip-vector.htm" class="is-active" data-collapsed="true">Clip Vector</a>"#,
    ));
    let mut session = ScriptedSession::new()
        .with_page(START, start)
        .with_page("https://docs.example.com/tools/clip.htm", clip)
        .with_page("https://docs.example.com/tools/clip-vector.htm", vector);

    let outcome = tokio::time::timeout(
        std::time::Duration::from_secs(5),
        run_crawl(&mut session, &config),
    )
    .await
    .expect("Crawl did not terminate")
    .unwrap();

    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Tools/001_Clip/000_Introduction.pdf",
            "001_Tools/001_Clip/001_Clip_Raster.pdf",
            "001_Tools/001_Clip/002_Clip_Vector/000_Introduction.pdf",
        ]
    );
    // Clip (folder opened) and Clip Raster (rendered) under Clip Vector
    assert_eq!(outcome.report.duplicates_skipped, 2);
    for url in session.printed_urls() {
        assert_eq!(session.print_count(&url), 1, "{} printed twice", url);
    }
}

#[tokio::test]
async fn test_lazy_folder_with_indentation_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawl.active_scope = ActiveScopeStrategy::Indentation;

    let start = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" data-collapsed="true">Clip</a>
           <a href="/tools/dissolve.htm">Dissolve</a>"#,
    ));
    let clip = nav(&section(
        "Tools",
        r#"<a href="/tools/clip.htm" class="is-active" data-navpress-left="20">Clip</a>
           <a href="/tools/clip-raster.htm" data-navpress-left="36">Clip Raster</a>
           <a href="/tools/dissolve.htm" data-navpress-left="20">Dissolve</a>"#,
    ));
    let mut session = ScriptedSession::new()
        .with_page(START, start)
        .with_page("https://docs.example.com/tools/clip.htm", clip);

    run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Tools/001_Clip/000_Introduction.pdf",
            "001_Tools/001_Clip/001_Clip_Raster.pdf",
            "001_Tools/002_Dissolve.pdf",
        ]
    );
}

#[tokio::test]
async fn test_duplicate_link_consumes_no_ordinal() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let sections = format!(
        "{}{}",
        section(
            "Guides",
            r#"<a href="/a.htm">A</a><a href="/b.htm">B</a>"#
        ),
        section(
            "Reference",
            r#"<a href="/a.htm#usage">A again</a><a href="/c.htm">C</a>"#
        ),
    );
    let mut session = ScriptedSession::new().with_page(START, nav(&sections));

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    let out = &config.output.directory;
    assert!(out.join("002_Reference/001_C.pdf").is_file());
    assert!(!out.join("002_Reference/002_C.pdf").exists());
    assert_eq!(session.print_count("https://docs.example.com/a.htm"), 1);
    assert_eq!(outcome.report.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_empty_artifact_is_retried_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new()
        .with_page(
            START,
            nav(&section(
                "Guides",
                r#"<a href="/a.htm">A</a><a href="/b.htm">B</a>"#,
            )),
        )
        .blank_prints("https://docs.example.com/a.htm", 1);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(session.print_count("https://docs.example.com/a.htm"), 2);
    assert_eq!(session.print_count("https://docs.example.com/b.htm"), 1);
    assert_eq!(outcome.report.verification_failures, 1);
    assert_eq!(outcome.report.recovered, 1);
    assert!(outcome.report.is_complete());

    let size = std::fs::metadata(config.output.directory.join("001_Guides/001_A.pdf"))
        .unwrap()
        .len();
    assert!(size >= config.verify.min_artifact_bytes);
}

#[tokio::test]
async fn test_retry_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new()
        .with_page(START, nav(&section("Guides", r#"<a href="/a.htm">A</a>"#)))
        .blank_prints("https://docs.example.com/a.htm", 10);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(session.print_count("https://docs.example.com/a.htm"), 2);
    assert_eq!(outcome.report.recovered, 0);
    assert_eq!(outcome.report.unrecovered.len(), 1);
    assert_eq!(
        outcome.report.unrecovered[0].url,
        "https://docs.example.com/a.htm"
    );
}

#[tokio::test]
async fn test_render_failure_does_not_halt_walk() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new()
        .with_page(
            START,
            nav(&section(
                "Guides",
                r#"<a href="/a.htm">A</a><a href="/b.htm">B</a>"#,
            )),
        )
        .failing_navigation("https://docs.example.com/a.htm", 1);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(outcome.report.render_failures, 1);
    assert_eq!(outcome.report.pages_rendered, 1);
    assert_eq!(outcome.report.recovered, 1);
    assert!(config.output.directory.join("001_Guides/001_A.pdf").is_file());
    assert!(config.output.directory.join("001_Guides/002_B.pdf").is_file());
}

#[tokio::test]
async fn test_deferred_group_is_expanded_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());

    let collapsed = nav(&format!(
        "{}{}",
        r#"<div class="accordion-section" data-url="/toc/data.js">
            <h4 class="accordion-title">Data</h4>
            <nav class="accordion-content"></nav>
        </div>"#,
        section("Guides", r#"<a href="/a.htm">A</a>"#),
    ));
    let expanded = nav(&format!(
        "{}{}",
        r#"<div class="accordion-section is-active" data-url="/toc/data.js">
            <h4 class="accordion-title">Data</h4>
            <nav class="accordion-content">
                <a href="/data/import.htm">Import</a>
                <a href="/data/export.htm">Export</a>
            </nav>
        </div>"#,
        section("Guides", r#"<a href="/a.htm">A</a>"#),
    ));
    let mut session = ScriptedSession::new()
        .with_page(START, collapsed)
        .with_revealed_section(START, "Data", expanded);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(session.reveal_count("Data"), 1);
    assert_eq!(outcome.tree[0].children.len(), 2);
    assert_eq!(outcome.report.groups_expanded, 1);
    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Data/001_Import.pdf",
            "001_Data/002_Export.pdf",
            "002_Guides/001_A.pdf",
        ]
    );
}

#[tokio::test]
async fn test_expansion_failure_leaves_group_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let page = nav(&format!(
        "{}{}",
        r#"<div class="accordion-section">
            <h4 class="accordion-title">Data</h4>
            <nav class="accordion-content"></nav>
        </div>"#,
        section("Guides", r#"<a href="/a.htm">A</a>"#),
    ));
    let mut session = ScriptedSession::new().with_page(START, page);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert!(config.output.directory.join("001_Data").is_dir());
    assert!(outcome.tree[0].children.is_empty());
    assert!(config.output.directory.join("002_Guides/001_A.pdf").is_file());
    assert_eq!(outcome.report.groups_expanded, 0);
}

#[tokio::test]
async fn test_paths_sort_in_print_order_with_contiguous_ordinals() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let sections = format!(
        "{}{}{}",
        section(
            "Get Started",
            r#"<a href="/intro.htm">What is it?</a>
               <a href="/install.htm">Install</a>
               <a href="/intro.htm#more">What is it (again)</a>
               <a href="/setup.htm">Setup</a>"#
        ),
        section(
            "Analysis",
            r#"<ul>
                <li><a href="/analysis/overlay.htm">Overlay</a>
                    <ul>
                        <li><a href="/analysis/union.htm">Union</a></li>
                        <li><a href="/install.htm">Install</a></li>
                        <li><a href="/analysis/erase.htm">Erase</a></li>
                    </ul>
                </li>
                <li><a href="/analysis/proximity.htm">Proximity</a></li>
            </ul>"#
        ),
        section("Help", r#"<a href="/faq.htm">FAQ</a>"#),
    );
    let mut session = ScriptedSession::new().with_page(START, nav(&sections));

    run_crawl(&mut session, &config).await.unwrap();

    let printed = relative(&config, &session.printed_paths());
    let mut sorted = printed.clone();
    sorted.sort();
    assert_eq!(printed, sorted);

    // Every sibling list, directories included, numbers 1..=n without gaps
    let mut by_dir: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
    for path in &printed {
        let segments: Vec<&str> = path.split('/').collect();
        for (i, segment) in segments.iter().enumerate() {
            let ordinal: u32 = segment[..3].parse().unwrap();
            by_dir
                .entry(segments[..i].join("/"))
                .or_default()
                .insert(ordinal);
        }
    }
    for (dir, ordinals) in &by_dir {
        let numbered: Vec<u32> = ordinals.iter().copied().filter(|o| *o > 0).collect();
        let expected: Vec<u32> = (1..=numbered.len() as u32).collect();
        assert_eq!(numbered, expected, "gap in '{}'", dir);
    }

    assert_eq!(
        printed,
        vec![
            "001_Get_Started/001_What_is_it.pdf",
            "001_Get_Started/002_Install.pdf",
            "001_Get_Started/003_Setup.pdf",
            "002_Analysis/001_Overlay/001_Union.pdf",
            "002_Analysis/001_Overlay/002_Erase.pdf",
            "002_Analysis/002_Proximity.pdf",
            "003_Help/001_FAQ.pdf",
        ]
    );
}

#[tokio::test]
async fn test_no_page_is_printed_more_than_twice() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let sections = format!(
        "{}{}",
        section(
            "Guides",
            r#"<a href="/a.htm">A</a>
               <a href="/a.htm#x" data-collapsed="true">A folder</a>"#
        ),
        section("More", r#"<a href="/a.htm">A</a><a href="/b.htm">B</a>"#),
    );
    let mut session = ScriptedSession::new()
        .with_page(START, nav(&sections))
        .blank_prints("https://docs.example.com/b.htm", 3);

    run_crawl(&mut session, &config).await.unwrap();

    for url in session.printed_urls() {
        assert!(session.print_count(&url) <= 2, "{} printed too often", url);
    }
    assert_eq!(session.print_count("https://docs.example.com/a.htm"), 1);
}

#[tokio::test]
async fn test_start_page_introduction() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = create_test_config(dir.path());
    config.crawl.start_page_intro = true;
    let sections = format!(
        "{}{}",
        section("Guides", r#"<a href="/en/start.htm">Start</a><a href="/a.htm">A</a>"#),
        section("Reference", r#"<a href="/c.htm">C</a>"#),
    );
    let mut session = ScriptedSession::new().with_page(START, nav(&sections));

    run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(
        relative(&config, &session.printed_paths()),
        vec![
            "001_Guides/000_Introduction.pdf",
            "001_Guides/001_A.pdf",
            "002_Reference/001_C.pdf",
        ]
    );
}

#[tokio::test]
async fn test_missing_navigation_root_is_empty_crawl() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new()
        .with_page(START, "<html><body><nav><a href='/a.htm'>A</a></nav></body></html>");

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert!(outcome.tree.is_empty());
    assert!(outcome.expected.is_empty());
    assert!(session.printed_paths().is_empty());
    assert!(config.output.directory.is_dir());
}

#[tokio::test]
async fn test_start_page_timeout_still_builds_tree() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new()
        .with_page(START, nav(&section("Guides", r#"<a href="/a.htm">A</a>"#)))
        .timing_out(START);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    assert_eq!(outcome.tree.len(), 1);
    assert!(config.output.directory.join("001_Guides/001_A.pdf").is_file());
}

#[tokio::test]
async fn test_side_files_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new().with_page(
        START,
        nav(&section("Guides", r#"<a href="/a.htm">A</a>"#)),
    );

    run_crawl(&mut session, &config).await.unwrap();

    let hierarchy = std::fs::read_to_string(&config.output.hierarchy_log).unwrap();
    assert!(hierarchy.contains("[+] 001_Guides/"));
    assert!(hierarchy.contains("  [-] 001_A.pdf"));

    let debug: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&config.output.debug_tree).unwrap())
            .unwrap();
    assert_eq!(debug[0]["type"], "group");
    assert_eq!(debug[0]["children"][0]["title"], "A");
}

#[tokio::test]
async fn test_separate_crawls_do_not_share_state() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let page = nav(&section("Guides", r#"<a href="/a.htm">A</a>"#));

    let mut first = ScriptedSession::new().with_page(START, page.clone());
    run_crawl(&mut first, &config).await.unwrap();

    let mut second = ScriptedSession::new().with_page(START, page);
    let outcome = run_crawl(&mut second, &config).await.unwrap();

    assert_eq!(outcome.report.pages_rendered, 1);
    assert_eq!(second.print_count("https://docs.example.com/a.htm"), 1);
}

#[tokio::test]
async fn test_dumped_sidebar_analyzes_like_live_page() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let page = nav(&format!(
        "{}{}",
        section("Guides", r#"<a href="/a.htm">A</a><a href="/b.htm">B</a>"#),
        section("Reference", r#"<a href="/c.htm" data-collapsed="true">C</a>"#),
    ));
    let mut session = ScriptedSession::new().with_page(START, page);
    let target = dir.path().join("sidebar.html");

    let bytes = dump_sidebar(&mut session, &config, &target).await.unwrap();

    let html = std::fs::read_to_string(&target).unwrap();
    assert_eq!(bytes, html.len());
    assert!(html.starts_with("<aside"));
    assert!(!html.contains("Body link"));

    let base = Url::parse(START).unwrap();
    let tree = analyze_sidebar(&html, &base, &config.markup);
    assert_eq!(tree.len(), 2);
    assert_eq!(tree[0].children.len(), 2);
    assert!(tree[1].children[0].is_lazy_folder());
}

#[tokio::test]
async fn test_dump_sidebar_without_root_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let mut session = ScriptedSession::new().with_page(START, "<html><body></body></html>");
    let target = dir.path().join("sidebar.html");

    assert!(dump_sidebar(&mut session, &config, &target).await.is_err());
    assert!(!target.exists());
}

#[tokio::test]
async fn test_long_sibling_list_widens_ordinals() {
    let dir = tempfile::tempdir().unwrap();
    let config = create_test_config(dir.path());
    let links: String = (1..=1000)
        .map(|i| format!(r#"<a href="/pages/{0}.htm">Page {0}</a>"#, i))
        .collect();
    let mut session = ScriptedSession::new()
        .with_page(START, nav(&section("Everything", &links)))
        .with_print_size(2000);

    let outcome = run_crawl(&mut session, &config).await.unwrap();

    let printed = relative(&config, &session.printed_paths());
    assert_eq!(printed.len(), 1000);
    assert_eq!(printed[0], "001_Everything/0001_Page_1.pdf");
    assert_eq!(printed[999], "001_Everything/1000_Page_1000.pdf");

    let mut sorted = printed.clone();
    sorted.sort();
    assert_eq!(printed, sorted);
    assert!(outcome.report.is_complete());
}
