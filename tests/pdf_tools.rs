use std::sync::Arc;

use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::CallToolResult;

use ai_studio_rmcp::cache::LocalFileStorage;
use ai_studio_rmcp::tools::{
    RotatePdfRequest, SplitPdfRequest, ToolContext, rotate_pdf, split_pdf,
};

fn context(name: &str) -> ToolContext {
    let base_dir = std::env::temp_dir().join(format!(
        "ai_studio_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ));
    ToolContext::new(Arc::new(LocalFileStorage::new(
        base_dir,
        "http://localhost:3000/cache".to_string(),
    )))
}

fn outcomes(result: &CallToolResult) -> Vec<serde_json::Value> {
    let value = serde_json::to_value(result).unwrap();
    let text = value["content"][0]["text"].as_str().unwrap();
    serde_json::from_str(text).unwrap()
}

#[tokio::test]
async fn split_reports_a_bad_range_per_file_instead_of_failing() {
    let context = context("split_bad_range");
    let request = SplitPdfRequest {
        urls: vec![
            "http://example.com/a.pdf".to_string(),
            "http://example.com/b.pdf".to_string(),
        ],
        pages: "abc-def".to_string(),
    };

    let result = split_pdf(&context, Parameters(request)).await.unwrap();
    let outcomes = outcomes(&result);
    assert_eq!(outcomes.len(), 2);
    for outcome in &outcomes {
        assert!(outcome["error"].as_str().unwrap().contains("invalid start page"));
        assert!(outcome.get("result_url").is_none());
    }
    assert_eq!(outcomes[0]["url"], "http://example.com/a.pdf");
    assert_eq!(outcomes[1]["url"], "http://example.com/b.pdf");
}

#[tokio::test]
async fn split_reports_an_unfetchable_url_per_file() {
    let context = context("split_bad_url");
    let request = SplitPdfRequest {
        urls: vec!["ftp://example.com/a.pdf".to_string()],
        pages: "1-2".to_string(),
    };

    let result = split_pdf(&context, Parameters(request)).await.unwrap();
    let outcomes = outcomes(&result);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["url"], "ftp://example.com/a.pdf");
    assert!(outcomes[0]["error"].is_string());
    assert!(outcomes[0].get("result_url").is_none());
}

#[tokio::test]
async fn rotate_reports_an_unfetchable_url_per_file() {
    let context = context("rotate_bad_url");
    let request = RotatePdfRequest {
        urls: vec!["ftp://example.com/a.pdf".to_string()],
        angle: 90,
    };

    let result = rotate_pdf(&context, Parameters(request)).await.unwrap();
    let outcomes = outcomes(&result);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0]["url"], "ftp://example.com/a.pdf");
    assert!(outcomes[0]["error"].is_string());
    assert!(outcomes[0].get("result_url").is_none());
}
