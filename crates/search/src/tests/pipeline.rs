//! End-to-end behavior of `StructRagClient`.

use super::{fragment, test_templates, CountingRetriever};
use crate::context::RequestContext;
use crate::rag::StructRagClient;
use crate::types::{Fragment, MemoryFilter};
use std::sync::Arc;
use structrag_core::{AppError, SearchConfig};
use structrag_llm::{MockClient, MockReply};
use structrag_prompt::TemplateStore;
use tokio_util::sync::CancellationToken;

const INDEX: &str = "default";
const QUESTION: &str = "How does AI change privacy and the economy?";

fn corpus() -> Vec<Fragment> {
    vec![
        fragment("ai", "f1", "ai.txt", "AI models learn from personal data, raising privacy concerns."),
        fragment("econ", "f2", "economy.txt", "The economy slowed as AI automation spread."),
        fragment("ai", "f1", "ai.txt", "Regulators link AI audits to privacy law."),
    ]
}

fn template_name(prompt: &str) -> &str {
    prompt.lines().next().unwrap_or_default()
}

fn variable<'a>(prompt: &'a str, name: &str) -> &'a str {
    let prefix = format!("{}=", name);
    prompt
        .lines()
        .find_map(|l| l.strip_prefix(prefix.as_str()))
        .unwrap_or_default()
}

/// Mock model: fixed route and decomposition, echoing extractions.
fn scripted(route: &'static str, subquestions: &'static str) -> MockClient {
    MockClient::new(move |prompt| match template_name(prompt) {
        "Route" => MockReply::Text(vec![route.to_string()]),
        "Decompose" => MockReply::text(subquestions),
        "Merge" => MockReply::Text(vec!["Final ".to_string(), "answer".to_string()]),
        name if name.starts_with("Construct") => MockReply::text(format!("structured by {}", name)),
        _ => MockReply::text(format!("knowledge for {}", variable(prompt, "subquery"))),
    })
}

fn client_with(
    retriever: Arc<CountingRetriever>,
    llm: MockClient,
    config: SearchConfig,
) -> StructRagClient {
    StructRagClient::new(retriever, Arc::new(llm), test_templates(), config).unwrap()
}

fn client(llm: MockClient) -> (StructRagClient, Arc<CountingRetriever>) {
    let retriever = Arc::new(CountingRetriever::new(INDEX, corpus()));
    (
        client_with(retriever.clone(), llm, SearchConfig::default()),
        retriever,
    )
}

async fn ask(client: &StructRagClient, question: &str) -> structrag_core::AppResult<crate::Answer> {
    client
        .ask(
            INDEX,
            question,
            &[],
            0.0,
            &RequestContext::new(),
            &CancellationToken::new(),
        )
        .await
}

#[tokio::test]
async fn test_no_fragments_returns_empty_answer_without_generation() {
    let llm = scripted("chunk", "q1");
    let (client, retriever) = client(llm.clone());

    let answer = ask(&client, "Completely unrelated zebra question").await.unwrap();

    assert_eq!(answer.result, "INFO NOT FOUND");
    assert!(answer.no_result);
    assert!(answer.relevant_sources.is_empty());
    assert_eq!(llm.call_count(), 0);
    assert_eq!(retriever.calls(), 1);
}

#[tokio::test]
async fn test_chunk_route_skips_construction() {
    let llm = scripted(" Chunk\n", "q1");
    let (client, _) = client(llm.clone());

    let answer = ask(&client, QUESTION).await.unwrap();
    assert_eq!(answer.result, "Final answer");
    assert!(!answer.no_result);

    let prompts = llm.prompts();
    let stages: Vec<_> = prompts.iter().map(|p| template_name(p)).collect();
    assert_eq!(stages, vec!["Route", "Decompose", "ExtractChunk", "Merge"]);

    // Knowledge is the raw fragments in retrieval order, instruction is the question
    let decompose = prompts[1].as_str();
    assert_eq!(variable(decompose, "query"), QUESTION);
    let kb_start = decompose.find("kb_info=").unwrap() + "kb_info=".len();
    let expected = [
        "economy.txt: The economy slowed as AI automation spread.",
        "ai.txt: AI models learn from personal data, raising privacy concerns.",
        "ai.txt: Regulators link AI audits to privacy law.",
    ]
    .join("\n");
    assert_eq!(&decompose[kb_start..], expected);
}

#[tokio::test]
async fn test_router_receives_one_title_per_document() {
    let llm = scripted("chunk", "q1");
    let (client, _) = client(llm.clone());

    ask(&client, QUESTION).await.unwrap();

    let prompts = llm.prompts();
    let route = &prompts[0];
    assert_eq!(variable(route, "query"), QUESTION);
    assert_eq!(variable(route, "titles"), "economy.txt ai.txt");
}

#[tokio::test]
async fn test_structured_route_runs_every_stage() {
    let llm = scripted("catalogue", "q1\nq2");
    let (client, _) = client(llm.clone());

    ask(&client, QUESTION).await.unwrap();

    let prompts = llm.prompts();
    let stages: Vec<_> = prompts.iter().map(|p| template_name(p)).collect();
    assert_eq!(
        stages,
        vec![
            "Route",
            "ConstructCatalogue",
            "Decompose",
            "ExtractCatalogue",
            "ExtractCatalogue",
            "Merge"
        ]
    );
    assert_eq!(variable(&prompts[2], "kb_info"), "structured by ConstructCatalogue");
    assert!(variable(&prompts[2], "query").starts_with(&format!("Query is {},", QUESTION)));
}

#[tokio::test]
async fn test_unknown_route_fails() {
    let llm = scripted("mindmap", "q1");
    let (client, _) = client(llm.clone());

    let result = ask(&client, QUESTION).await;

    match result {
        Err(AppError::InvalidRoute(tag)) => assert_eq!(tag, "mindmap"),
        other => panic!("Expected invalid route, got {:?}", other),
    }
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_unknown_route_falls_back_when_enabled() {
    let llm = scripted("mindmap", "q1");
    let retriever = Arc::new(CountingRetriever::new(INDEX, corpus()));
    let config = SearchConfig {
        fallback_to_chunk: true,
        ..SearchConfig::default()
    };
    let client = client_with(retriever, llm.clone(), config);

    let answer = ask(&client, QUESTION).await.unwrap();

    assert_eq!(answer.result, "Final answer");
    assert_eq!(template_name(&llm.prompts()[2]), "ExtractChunk");
}

#[tokio::test]
async fn test_subquestions_drop_blanks_and_keep_order() {
    let llm = scripted("table", "Third?\n\n  \nFirst?\nSecond?\n");
    let (client, _) = client(llm.clone());

    ask(&client, QUESTION).await.unwrap();

    let prompts = llm.prompts();
    let extracted: Vec<_> = prompts
        .iter()
        .filter(|p| template_name(p) == "ExtractTable")
        .map(|p| variable(p, "subquery"))
        .collect();
    assert_eq!(extracted, vec!["Third?", "First?", "Second?"]);

    let merge = prompts.last().unwrap();
    let third = merge.find("Subquery: Third?").unwrap();
    let first = merge.find("Subquery: First?").unwrap();
    let second = merge.find("Subquery: Second?").unwrap();
    assert!(third < first && first < second);
    assert!(merge.contains("Retrieval results:\nknowledge for Third?"));
}

#[tokio::test]
async fn test_citations_grouped_by_document() {
    let llm = scripted("graph", "q1");
    let (client, _) = client(llm);

    let answer = ask(&client, QUESTION).await.unwrap();

    // Documents appear in retrieval order: "econ" scores highest
    assert_eq!(answer.relevant_sources.len(), 2);
    let ai = &answer.relevant_sources[1];
    assert_eq!(ai.document_id, "ai");
    assert_eq!(ai.partitions.len(), 2);
    assert!(ai.partitions.iter().all(|p| p.relevance.is_none()));
    let econ = &answer.relevant_sources[0];
    assert_eq!(econ.document_id, "econ");
    assert_eq!(econ.partitions.len(), 1);
    assert_eq!(
        econ.partitions[0].text,
        "The economy slowed as AI automation spread."
    );
}

#[tokio::test]
async fn test_ask_is_deterministic() {
    let llm = scripted("algorithm", "q1\nq2");
    let (client, _) = client(llm);

    let first = ask(&client, QUESTION).await.unwrap();
    let second = ask(&client, QUESTION).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cancel_during_merge() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let llm = MockClient::new(move |prompt| match template_name(prompt) {
        "Route" => MockReply::text("chunk"),
        "Decompose" => MockReply::text("q1"),
        "Merge" => {
            trigger.cancel();
            MockReply::Hang(vec!["Partial ans".to_string()])
        }
        _ => MockReply::text("knowledge"),
    });
    let (client, _) = client(llm.clone());

    let result = client
        .ask(INDEX, QUESTION, &[], 0.0, &RequestContext::new(), &cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    let prompts = llm.prompts();
    assert_eq!(template_name(prompts.last().unwrap()), "Merge");
}

#[tokio::test]
async fn test_cancelled_before_retrieval() {
    let llm = scripted("chunk", "q1");
    let (client, _) = client(llm.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = client
        .ask(INDEX, QUESTION, &[], 0.0, &RequestContext::new(), &cancel)
        .await;

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let llm = MockClient::new(|prompt| match template_name(prompt) {
        "Route" => MockReply::text("chunk"),
        _ => MockReply::Fail("rate limited".to_string()),
    });
    let (client, _) = client(llm);

    let result = ask(&client, QUESTION).await;
    assert!(matches!(result, Err(AppError::Llm(msg)) if msg == "rate limited"));
}

#[tokio::test]
async fn test_context_overrides_reach_generator() {
    let llm = scripted("chunk", "q1");
    let (client, _) = client(llm.clone());
    let context = RequestContext::new().with_max_tokens(4096).with_temperature(0.4);

    client
        .ask(INDEX, QUESTION, &[], 0.0, &context, &CancellationToken::new())
        .await
        .unwrap();

    for request in llm.requests() {
        assert_eq!(request.options.max_tokens, 4096);
        assert_eq!(request.options.temperature, 0.4);
        assert_eq!(request.options.top_p, 0.0);
    }
}

#[tokio::test]
async fn test_search_without_query_or_filters() {
    let llm = scripted("chunk", "q1");
    let (client, retriever) = client(llm.clone());

    let result = client
        .search(INDEX, "  ", &[], 0.0, None, &CancellationToken::new())
        .await
        .unwrap();

    assert!(result.no_result());
    assert_eq!(retriever.calls(), 0);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_search_with_unconditional_filter_lists_everything() {
    let llm = scripted("chunk", "q1");
    let (client, retriever) = client(llm.clone());

    let result = client
        .search(INDEX, "", &[MemoryFilter::new()], 0.0, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(retriever.list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    let links: Vec<_> = result.results.iter().map(|c| c.link.as_str()).collect();
    assert_eq!(links, vec!["default/ai/f1", "default/econ/f2"]);
    assert_eq!(result.results[0].partitions.len(), 2);
    assert_eq!(llm.call_count(), 0);
}

#[tokio::test]
async fn test_search_by_similarity_groups_by_file() {
    let llm = scripted("chunk", "q1");
    let (client, retriever) = client(llm.clone());

    let result = client
        .search(INDEX, "AI privacy", &[], 0.0, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(retriever.calls(), 1);
    assert_eq!(llm.call_count(), 0);
    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].link, "default/ai/f1");
    assert_eq!(result.results[0].partitions.len(), 2);
    let relevance: Vec<_> = result.results[0]
        .partitions
        .iter()
        .map(|p| p.relevance.unwrap())
        .collect();
    assert_eq!(relevance, vec![1.0, 1.0]);
    assert_eq!(result.results[1].partitions[0].relevance, Some(0.5));
}

#[tokio::test]
async fn test_search_by_filters_has_no_relevance() {
    let fragments = vec![
        fragment("a", "f1", "a.txt", "alpha").with_tag("team", "red"),
        fragment("b", "f2", "b.txt", "beta").with_tag("team", "blue"),
        fragment("c", "f3", "c.txt", "").with_tag("team", "red"),
    ];
    let retriever = Arc::new(CountingRetriever::new(INDEX, fragments));
    let client = client_with(retriever.clone(), scripted("chunk", "q1"), SearchConfig::default());

    let filters = [MemoryFilter::new().by_tag("team", "red")];
    let result = client
        .search(INDEX, "", &filters, 0.0, None, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(retriever.list_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(result.results.len(), 1);
    assert_eq!(result.results[0].document_id, "a");
    assert_eq!(result.results[0].partitions[0].relevance, None);
}

#[tokio::test]
async fn test_search_respects_limit() {
    let fragments = (0..5)
        .map(|i| fragment(&format!("d{}", i), "f", "x.txt", "shared term"))
        .collect();
    let retriever = Arc::new(CountingRetriever::new(INDEX, fragments));
    let client = client_with(retriever, scripted("chunk", "q1"), SearchConfig::default());

    let result = client
        .search(INDEX, "shared", &[], 0.0, Some(2), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.results.len(), 2);
}

#[tokio::test]
async fn test_list_indexes() {
    let (client, _) = client(scripted("chunk", "q1"));
    let indexes = client.list_indexes(&CancellationToken::new()).await.unwrap();
    assert_eq!(indexes, vec![INDEX.to_string()]);
}

#[test]
fn test_missing_template_fails_construction() {
    let retriever = Arc::new(CountingRetriever::new(INDEX, corpus()));
    let templates = TemplateStore::from_entries([("StructRAG", "Route", "{{$query}} {{$titles}}")]);

    let result = StructRagClient::new(
        retriever,
        Arc::new(scripted("chunk", "q1")),
        templates,
        SearchConfig::default(),
    );

    match result {
        Err(AppError::Prompt(msg)) => assert!(msg.contains("missing template StructRAG/Merge")),
        Err(other) => panic!("Expected prompt error, got {}", other),
        Ok(_) => panic!("Expected prompt error"),
    }
}

#[test]
fn test_invalid_config_fails_construction() {
    let retriever = Arc::new(CountingRetriever::new(INDEX, corpus()));
    let config = SearchConfig {
        max_matches_count: 0,
        ..SearchConfig::default()
    };

    let result = StructRagClient::new(
        retriever,
        Arc::new(scripted("chunk", "q1")),
        test_templates(),
        config,
    );
    assert!(matches!(result, Err(AppError::Config(_))));
}

#[test]
fn test_bundled_templates_are_complete() {
    let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../prompts");
    let store = TemplateStore::load_dir(&dir).unwrap();

    store.validate(crate::REQUIRED_TEMPLATES).unwrap();
    assert_eq!(store.len(), crate::REQUIRED_TEMPLATES.len());
}
