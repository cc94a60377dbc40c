// tests/conversion.rs
//! Block trees to documents, including media localization and custom
//! transforms, through the public converter and processor.

mod common;

use common::{block, bulleted, heading, id, image, paragraph, FakeStore, FakeTransport};
use notion2article::{
    transform, ApiKey, ArticlePipeline, BatchOptions, ArticleProcessor, Block, BlockFetcher, BlockId,
    DocumentConverter, ErrorCode, MediaLocalizer, ProcessorConfig, RetryPolicy,
    TransformContext, TransformRegistry,
};
use pretty_assertions::assert_eq;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn converter(store: FakeStore, transport: &Arc<FakeTransport>, media_dir: &Path) -> DocumentConverter {
    let fetcher = BlockFetcher::new(Arc::new(store), RetryPolicy::linear(0, Duration::ZERO));
    let media = MediaLocalizer::new(media_dir, "/images", transport.clone());
    DocumentConverter::new(fetcher, TransformRegistry::default(), media)
}

fn config(media_dir: &Path) -> ProcessorConfig {
    let mut config = ProcessorConfig::new(ApiKey::new("secret_test_key_123456789").unwrap());
    config.image_directory = media_dir.to_path_buf();
    config.max_retries = 0;
    config.retry_delay = Duration::ZERO;
    config
}

#[tokio::test]
async fn heading_and_image_become_markdown_with_local_media() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let store = FakeStore::new().with_children(
        "doc",
        vec![
            heading("h1", 1, "Title"),
            image("img", "https://cdn.example/photo.jpg", "alt"),
        ],
    );

    let result = converter(store, &transport, dir.path())
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap();

    assert_eq!(result.document, "# Title\n\n![alt](/images/photo_0.jpg)");
    assert_eq!(result.media.len(), 1);
    let media = &result.media[0];
    assert_eq!(media.original_url, "https://cdn.example/photo.jpg");
    assert!(media.local_path.ends_with("photo_0.jpg"));
    assert_eq!(media.document_path, "/images/photo_0.jpg");
    assert_eq!(std::fs::read(&media.local_path).unwrap(), b"fake-bytes");
    assert_eq!(transport.requests(), ["https://cdn.example/photo.jpg"]);
}

#[tokio::test]
async fn failed_download_keeps_the_original_reference() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new().with_failing("https://cdn.example/broken.jpg"));
    let store = FakeStore::new().with_children(
        "doc",
        vec![
            image("i1", "https://cdn.example/broken.jpg", "first"),
            image("i2", "https://cdn.example/second.gif", "second"),
        ],
    );

    let result = converter(store, &transport, dir.path())
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap();

    assert_eq!(
        result.document,
        "![first](https://cdn.example/broken.jpg)\n\n![second](/images/second_1.gif)"
    );
    assert_eq!(result.media.len(), 1);
    assert!(result.media[0].local_path.ends_with("second_1.gif"));
}

#[tokio::test]
async fn relative_and_non_http_references_are_left_alone() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let store = FakeStore::new().with_children(
        "doc",
        vec![
            paragraph("p1", "![local](images/a.png)"),
            paragraph("p2", "![ftp](ftp://host/b.png)"),
        ],
    );

    let result = converter(store, &transport, dir.path())
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap();

    assert!(result.media.is_empty());
    assert!(result.document.contains("![local](images/a.png)"));
    assert!(result.document.contains("![ftp](ftp://host/b.png)"));
    assert_eq!(transport.requests(), Vec::<String>::new());
}

#[tokio::test]
async fn nested_list_items_are_indented() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let store = FakeStore::new()
        .with_children("doc", vec![bulleted("a", "outer", true)])
        .with_children("a", vec![bulleted("b", "inner", false)]);

    let result = converter(store, &transport, dir.path())
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap();

    assert_eq!(result.document, "- outer\n  - inner");
}

#[tokio::test]
async fn missing_document_is_a_typed_fetch_error() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let store = FakeStore::new().with_missing("doc");

    let err = converter(store, &transport, dir.path())
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap_err();

    assert_eq!(err.code(), ErrorCode::BlockNotFound);
}

#[tokio::test]
async fn custom_transforms_override_defaults() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new()
        .with_page("doc", "Custom")
        .with_children(
            "doc",
            vec![heading("h", 2, "Kept"), paragraph("p", "shout this")],
        );
    let config = config(dir.path()).with_transformer(
        "paragraph",
        transform(|block: &Block, _ctx: &TransformContext<'_>| {
            let text: String = block.rich_text().iter().map(|r| r.plain_text.as_str()).collect();
            Ok(text.to_uppercase())
        }),
    );

    let processor = ArticleProcessor::with_collaborators(
        &config,
        Arc::new(store),
        Arc::new(FakeTransport::new()),
    );
    let article = processor.process_article(&id("doc")).await.unwrap();

    assert_eq!(article.document, "## Kept\n\nSHOUT THIS");
    assert_eq!(article.metadata.document.title, "Custom");
}

#[tokio::test]
async fn registered_transform_can_inspect_the_tree() {
    let dir = TempDir::new().unwrap();
    let transport = Arc::new(FakeTransport::new());
    let store = FakeStore::new()
        .with_children(
            "doc",
            vec![block("t", "column_list", true, serde_json::json!({}))],
        )
        .with_children("t", vec![paragraph("c1", "one"), paragraph("c2", "two")]);
    let fetcher = BlockFetcher::new(Arc::new(store), RetryPolicy::linear(0, Duration::ZERO));

    let mut registry = TransformRegistry::default();
    assert!(registry.has("paragraph"));
    assert!(!registry.has("column_list"));
    registry.register("column_list", |block: &Block, ctx: &TransformContext<'_>| {
        let children = ctx.tree().children_of(block).len();
        Ok(format!("<details {} items>\n{}", children, ctx.render_children(block)))
    });
    assert!(registry.has("column_list"));

    let media = MediaLocalizer::new(dir.path(), "/images", transport);
    let result = DocumentConverter::new(fetcher, registry, media)
        .convert_by_id(&BlockId::parse("doc").unwrap())
        .await
        .unwrap();

    assert_eq!(result.document, "<details 2 items>\none\ntwo");
}

#[tokio::test]
async fn processed_article_carries_derived_metadata_and_media_format() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new()
        .with_page_properties(
            "doc",
            serde_json::json!({
                "Name": common::title_property("Launch"),
                "Tags": {"id": "t", "type": "multi_select", "multi_select": [{"name": "news"}]},
                "Author": {"id": "a", "type": "people", "people": [{"object": "user", "id": "u", "name": "Ari"}]},
                "Status": {"id": "s", "type": "select", "select": {"name": "Preview"}}
            }),
        )
        .with_children(
            "doc",
            vec![image("i", "https://cdn.example/shot.PNG?v=2", "")],
        );

    let processor = ArticleProcessor::with_collaborators(
        &config(dir.path()),
        Arc::new(store),
        Arc::new(FakeTransport::new()),
    );
    let article = processor.process_article(&id("doc")).await.unwrap();

    assert_eq!(article.metadata.tags, vec!["news"]);
    assert_eq!(article.metadata.author.as_deref(), Some("Ari"));
    assert_eq!(article.metadata.status.as_deref(), Some("Preview"));
    assert_eq!(article.media.len(), 1);
    assert_eq!(article.media[0].format.as_deref(), Some("png"));
    assert_eq!(article.document, "![](/images/shot_0.PNG)");
}

#[tokio::test]
async fn pipeline_failures_are_wrapped_with_the_article_id() {
    let dir = TempDir::new().unwrap();
    let processor = ArticleProcessor::with_collaborators(
        &config(dir.path()),
        Arc::new(FakeStore::new().with_missing("gone")),
        Arc::new(FakeTransport::new()),
    );

    let err = processor.process_article(&id("gone")).await.unwrap_err();

    assert_eq!(err.code(), ErrorCode::ProcessFailed);
    assert!(err.to_string().starts_with("Failed to process article gone"), "{err}");
}

#[tokio::test]
async fn articles_sharing_a_media_directory_keep_their_own_files() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new()
        .with_page("doca", "A")
        .with_page("docb", "B")
        .with_children(
            "doca",
            vec![image("ia", "https://files.example/aaa/Untitled.png", "")],
        )
        .with_children(
            "docb",
            vec![image("ib", "https://files.example/bbb/Untitled.png", "")],
        );
    let mut config = config(dir.path());
    config.media_per_article = true;

    let processor = ArticleProcessor::with_collaborators(
        &config,
        Arc::new(store),
        Arc::new(FakeTransport::new().echoing_url()),
    );
    let result = processor
        .process_many(&common::ids(&["doca", "docb"]), &BatchOptions::default())
        .await
        .unwrap();

    assert!(result.failed.is_empty());
    assert_eq!(result.successful.len(), 2);
    for (scope, url) in [
        ("doca", "https://files.example/aaa/Untitled.png"),
        ("docb", "https://files.example/bbb/Untitled.png"),
    ] {
        let article = result
            .successful
            .iter()
            .find(|a| a.metadata.document.id.as_str() == scope)
            .unwrap();
        let local = &article.media[0].media.local_path;
        assert_eq!(article.document, format!("![](/images/{}/Untitled_0.png)", scope));
        assert_eq!(local, &dir.path().join(scope).join("Untitled_0.png"));
        assert_eq!(std::fs::read_to_string(local).unwrap(), url);
    }
}

#[tokio::test]
async fn unscoped_processor_writes_into_the_media_directory() {
    let dir = TempDir::new().unwrap();
    let store = FakeStore::new()
        .with_page("doc", "Flat")
        .with_children("doc", vec![image("i", "https://cdn.example/a.gif", "")]);

    let processor = ArticleProcessor::with_collaborators(
        &config(dir.path()),
        Arc::new(store),
        Arc::new(FakeTransport::new()),
    );
    let article = processor.process_article(&id("doc")).await.unwrap();

    assert_eq!(article.document, "![](/images/a_0.gif)");
    assert_eq!(article.media[0].media.local_path, dir.path().join("a_0.gif"));
}
