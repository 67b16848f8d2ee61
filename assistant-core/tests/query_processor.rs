use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, Ordering},
};

use ai_llm_service::{AiLlmError, ChatTurn};
use assistant_core::{
    AssistantConfig, AssistantError, ChatQuery, ChatStreamChunk, ConversationMessage,
    FragmentStream, GenerationProvider, QueryFilters, QueryProcessor, RetrievalProvider,
    RetrievedDocument, Role, STREAM_APOLOGY, SYNC_APOLOGY,
};
use futures::{FutureExt, StreamExt, future::BoxFuture, stream};
use rag_store::{RagError, RagFilter};
use serde_json::json;

/* ---------------------------- test doubles ---------------------------- */

#[derive(Default)]
struct MockRetrieval {
    docs: Vec<RetrievedDocument>,
    fail: bool,
    calls: Mutex<Vec<(String, usize, Option<RagFilter>)>>,
}

impl RetrievalProvider for MockRetrieval {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
        filter: Option<RagFilter>,
    ) -> BoxFuture<'a, Result<Vec<RetrievedDocument>, AssistantError>> {
        self.calls
            .lock()
            .unwrap()
            .push((query.to_string(), top_k, filter));
        let out: Result<Vec<RetrievedDocument>, AssistantError> = if self.fail {
            Err(RagError::Qdrant("connection refused".into()).into())
        } else {
            Ok(self.docs.clone())
        };
        async move { out }.boxed()
    }

    fn is_available(&self) -> bool {
        !self.fail
    }

    fn vector_db_type(&self) -> &str {
        "mock"
    }
}

/// What the streaming mode should do.
#[derive(Clone)]
enum StreamPlan {
    Fragments(Vec<&'static str>),
    FailToOpen,
    BreakAfter(Vec<&'static str>),
    /// Fragments, then never finishes; sets the flag when dropped.
    Endless(Vec<&'static str>, Arc<AtomicBool>),
}

/// Sets its flag when the provider stream holding it is dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

struct MockGeneration {
    answer: Result<&'static str, ()>,
    plan: StreamPlan,
    seen: Mutex<Vec<(String, String, Option<Vec<ChatTurn>>)>>,
}

impl MockGeneration {
    fn answering(answer: &'static str) -> Self {
        Self {
            answer: Ok(answer),
            plan: StreamPlan::Fragments(vec![]),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn streaming(plan: StreamPlan) -> Self {
        Self {
            answer: Ok(""),
            plan,
            seen: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, prompt: &str, context: &str, history: Option<&[ChatTurn]>) {
        self.seen.lock().unwrap().push((
            prompt.to_string(),
            context.to_string(),
            history.map(<[ChatTurn]>::to_vec),
        ));
    }
}

impl GenerationProvider for MockGeneration {
    fn generate_response<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<String, AssistantError>> {
        self.record(prompt, context, history);
        let out: Result<String, AssistantError> = self
            .answer
            .map(str::to_string)
            .map_err(|_| AiLlmError::Stream("model crashed".into()).into());
        async move { out }.boxed()
    }

    fn generate_response_stream<'a>(
        &'a self,
        prompt: &'a str,
        context: &'a str,
        history: Option<&'a [ChatTurn]>,
    ) -> BoxFuture<'a, Result<FragmentStream, AssistantError>> {
        self.record(prompt, context, history);
        let out: Result<FragmentStream, AssistantError> = match self.plan.clone() {
            StreamPlan::Fragments(parts) => {
                Ok(stream::iter(parts.into_iter().map(|p| Ok(p.to_string()))).boxed())
            }
            StreamPlan::FailToOpen => Err(AiLlmError::Stream("refused".into()).into()),
            StreamPlan::BreakAfter(parts) => {
                let mut items: Vec<Result<String, AssistantError>> =
                    parts.into_iter().map(|p| Ok(p.to_string())).collect();
                items.push(Err(AiLlmError::Stream("connection reset".into()).into()));
                Ok(stream::iter(items).boxed())
            }
            StreamPlan::Endless(parts, dropped) => {
                let guard = DropFlag(dropped);
                Ok(stream::iter(parts.into_iter().map(|p| Ok(p.to_string())))
                    .chain(stream::pending())
                    .map(move |item| {
                        let _held = &guard;
                        item
                    })
                    .boxed())
            }
        };
        async move { out }.boxed()
    }

    fn is_available(&self) -> bool {
        self.answer.is_ok()
    }
}

fn doc(text: &str, source: &str, score: f32) -> RetrievedDocument {
    RetrievedDocument {
        text: text.into(),
        metadata: json!({ "source": source }),
        score,
    }
}

fn processor(
    retrieval: MockRetrieval,
    generation: MockGeneration,
) -> (QueryProcessor, Arc<MockRetrieval>, Arc<MockGeneration>) {
    let r = Arc::new(retrieval);
    let g = Arc::new(generation);
    let p = QueryProcessor::new(r.clone(), g.clone(), AssistantConfig::default());
    (p, r, g)
}

async fn collect(p: &QueryProcessor, q: ChatQuery) -> Vec<ChatStreamChunk> {
    p.process_query_stream(q).collect().await
}

/* ------------------------------ sync mode ----------------------------- */

#[tokio::test]
async fn answers_from_single_document() {
    let (p, r, g) = processor(
        MockRetrieval {
            docs: vec![doc("Appointment ID: 42\nDate: 2025-11-05", "Appointment #42", 0.91)],
            ..Default::default()
        },
        MockGeneration::answering("Your next appointment is on the 5th."),
    );

    let resp = p
        .process_query(ChatQuery::new("When is my next appointment?"))
        .await;

    assert_eq!(resp.answer, "Your next appointment is on the 5th.");
    assert!((resp.confidence - 0.91).abs() < 1e-6);
    assert_eq!(resp.sources, vec!["Appointment #42"]);
    assert!(!resp.from_cache);
    assert_eq!(resp.session_id.len(), 36);

    let calls = r.calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "When is my next appointment?");
    assert_eq!(calls[0].1, 5);
    assert_eq!(calls[0].2, None);

    let seen = g.seen.lock().unwrap();
    assert_eq!(
        seen[0].1,
        "[1] (Relevance: 0.91)\nAppointment ID: 42\nDate: 2025-11-05"
    );
}

#[tokio::test]
async fn empty_retrieval_still_generates() {
    let (p, _r, g) = processor(
        MockRetrieval::default(),
        MockGeneration::answering("I could not find any appointment."),
    );

    let resp = p.process_query(ChatQuery::new("Any bookings on Sunday?")).await;

    assert_eq!(resp.answer, "I could not find any appointment.");
    assert_eq!(resp.confidence, 0.0);
    assert!(resp.sources.is_empty());
    assert_eq!(g.seen.lock().unwrap()[0].1, "No relevant information found.");
}

#[tokio::test]
async fn retrieval_failure_yields_apology() {
    let (p, _r, g) = processor(
        MockRetrieval {
            fail: true,
            ..Default::default()
        },
        MockGeneration::answering("unused"),
    );

    let resp = p
        .process_query(ChatQuery::new("When is my next appointment?").with_session("s-1"))
        .await;

    assert_eq!(resp.answer, SYNC_APOLOGY);
    assert_eq!(resp.session_id, "s-1");
    assert_eq!(resp.confidence, 0.0);
    assert!(resp.sources.is_empty());
    assert!(!resp.from_cache);
    assert!(g.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_yields_apology() {
    let (p, _r, _g) = processor(
        MockRetrieval {
            docs: vec![doc("Appointment ID: 1", "Appointment #1", 0.8)],
            ..Default::default()
        },
        MockGeneration {
            answer: Err(()),
            plan: StreamPlan::Fragments(vec![]),
            seen: Mutex::new(Vec::new()),
        },
    );

    let resp = p.process_query(ChatQuery::new("status?")).await;
    assert_eq!(resp.answer, SYNC_APOLOGY);
    assert_eq!(resp.confidence, 0.0);
    assert!(resp.sources.is_empty());
}

#[tokio::test]
async fn filters_and_history_reach_providers() {
    let (p, r, g) = processor(
        MockRetrieval::default(),
        MockGeneration::answering("ok"),
    );

    let mut filters = QueryFilters {
        appointment_date: Some("2025-10-20".into()),
        ..Default::default()
    };
    filters.extra.insert("mechanic".into(), json!("Sam"));

    let history = vec![
        ConversationMessage::new(Role::User, "Hi"),
        ConversationMessage::new(Role::Assistant, "Hello! How can I help?"),
    ];

    p.process_query(
        ChatQuery::new("What is booked that day?")
            .with_filters(filters)
            .with_history(history),
    )
    .await;

    let filter = r.calls.lock().unwrap()[0].2.clone().unwrap();
    assert_eq!(filter.equals, vec![("date".to_string(), json!("2025-10-20"))]);

    let seen = g.seen.lock().unwrap();
    let turns = seen[0].2.as_ref().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[0], ChatTurn::new("user", "Hi"));
    assert_eq!(turns[1], ChatTurn::new("assistant", "Hello! How can I help?"));
}

#[tokio::test]
async fn confidence_averages_top_three() {
    let (p, _r, _g) = processor(
        MockRetrieval {
            docs: vec![
                doc("a", "A", 0.9),
                doc("b", "B", 0.8),
                doc("c", "C", 0.4),
                doc("d", "A", 0.1),
            ],
            ..Default::default()
        },
        MockGeneration::answering("ok"),
    );

    let resp = p.process_query(ChatQuery::new("q")).await;
    assert!((resp.confidence - 0.7).abs() < 1e-5);
    assert_eq!(resp.sources, vec!["A", "B", "C", "A"]);
}

/* ---------------------------- stream mode ----------------------------- */

#[tokio::test]
async fn stream_numbers_chunks_and_ends_with_final() {
    let (p, _r, _g) = processor(
        MockRetrieval {
            docs: vec![doc("Appointment ID: 42", "Appointment #42", 0.91)],
            ..Default::default()
        },
        MockGeneration::streaming(StreamPlan::Fragments(vec!["Hello", " there"])),
    );

    let chunks = collect(&p, ChatQuery::new("Hi").with_session("s-9")).await;

    let view: Vec<(&str, bool, u32)> = chunks
        .iter()
        .map(|c| (c.content.as_str(), c.is_final, c.chunk_index))
        .collect();
    assert_eq!(
        view,
        vec![("Hello", false, 0), (" there", false, 1), ("", true, 2)]
    );
    assert!(chunks.iter().all(|c| c.session_id == "s-9"));
}

#[tokio::test]
async fn stream_without_fragments_emits_only_final() {
    let (p, _r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::Fragments(vec![])),
    );

    let chunks = collect(&p, ChatQuery::new("Hi")).await;
    assert_eq!(chunks.len(), 1);
    assert!(chunks[0].is_final);
    assert_eq!(chunks[0].chunk_index, 0);
    assert_eq!(chunks[0].content, "");
}

#[tokio::test]
async fn stream_retrieval_failure_emits_single_apology() {
    let (p, _r, g) = processor(
        MockRetrieval {
            fail: true,
            ..Default::default()
        },
        MockGeneration::streaming(StreamPlan::Fragments(vec!["never"])),
    );

    let chunks = collect(&p, ChatQuery::new("Hi")).await;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, STREAM_APOLOGY);
    assert!(chunks[0].is_final);
    assert_eq!(chunks[0].chunk_index, 0);
    assert!(g.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn stream_open_failure_emits_single_apology() {
    let (p, _r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::FailToOpen),
    );

    let chunks = collect(&p, ChatQuery::new("Hi")).await;
    assert_eq!(chunks.len(), 1);
    assert_eq!(chunks[0].content, STREAM_APOLOGY);
    assert!(chunks[0].is_final);
}

#[tokio::test]
async fn stream_broken_midway_keeps_emitted_chunks() {
    let (p, _r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::BreakAfter(vec!["Your", " car"])),
    );

    let chunks = collect(&p, ChatQuery::new("Hi")).await;
    assert_eq!(chunks.len(), 3);
    assert_eq!(chunks[0].content, "Your");
    assert_eq!(chunks[1].content, " car");
    assert_eq!(chunks[2].content, STREAM_APOLOGY);
    assert!(chunks[2].is_final);
    assert_eq!(chunks[2].chunk_index, 0);
    assert_eq!(chunks.iter().filter(|c| c.is_final).count(), 1);
}

#[tokio::test]
async fn stream_is_lazy_until_polled() {
    let (p, r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::Fragments(vec!["x"])),
    );

    let s = p.process_query_stream(ChatQuery::new("Hi"));
    assert!(r.calls.lock().unwrap().is_empty());
    drop(s);
    assert!(r.calls.lock().unwrap().is_empty());
}

#[tokio::test]
async fn dropping_stream_mid_answer_abandons_provider_stream() {
    let dropped = Arc::new(AtomicBool::new(false));
    let (p, _r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::Endless(vec!["Your", " car"], dropped.clone())),
    );

    let mut s = p.process_query_stream(ChatQuery::new("Hi"));
    let first = s.next().await.unwrap();
    assert_eq!(first.content, "Your");
    assert!(!first.is_final);
    assert!(!dropped.load(Ordering::SeqCst));

    drop(s);
    assert!(dropped.load(Ordering::SeqCst));

    // The processor stays usable after an abandoned stream.
    assert_eq!(p.get_statistics().max_context_docs, 5);
}

#[tokio::test]
async fn generated_session_id_is_shared_by_all_chunks() {
    let (p, _r, _g) = processor(
        MockRetrieval::default(),
        MockGeneration::streaming(StreamPlan::Fragments(vec!["a", "b", "c"])),
    );

    let chunks = collect(&p, ChatQuery::new("Hi")).await;
    let first = &chunks[0].session_id;
    assert_eq!(first.len(), 36);
    assert!(chunks.iter().all(|c| &c.session_id == first));
}

/* ----------------------------- statistics ----------------------------- */

#[tokio::test]
async fn statistics_are_idempotent() {
    let (p, _r, _g) = processor(
        MockRetrieval {
            fail: true,
            ..Default::default()
        },
        MockGeneration::answering("ok"),
    );

    let a = p.get_statistics();
    let b = p.get_statistics();
    assert_eq!(a, b);
    assert_eq!(a.vector_db_type, "mock");
    assert_eq!(a.max_context_docs, 5);
    assert!(a.llm_available);
    assert!(!a.vector_db_available);
}

#[tokio::test]
async fn configured_doc_limit_reaches_retrieval() {
    let r = Arc::new(MockRetrieval {
        docs: vec![doc("Appointment ID: 3", "Appointment #3", 0.7)],
        ..Default::default()
    });
    let g = Arc::new(MockGeneration::answering("ok"));
    let p = QueryProcessor::new(
        r.clone(),
        g.clone(),
        AssistantConfig {
            max_context_docs: 2,
        },
    );

    p.process_query(ChatQuery::new("What is booked?")).await;
    let _ = collect(&p, ChatQuery::new("What is booked?")).await;

    let calls = r.calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert!(calls.iter().all(|c| c.1 == 2));
    assert_eq!(p.get_statistics().max_context_docs, 2);
}
