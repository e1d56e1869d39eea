// End-to-end tests driving the sayr-bench binary

use std::process::{Command, Output};

use serde_json::{json, Value};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BIN: &str = env!("CARGO_BIN_EXE_sayr-bench");

/// Run the binary in an empty working directory with a scrubbed environment
async fn sayr_bench(args: &[&str], envs: &[(&str, &str)]) -> Output {
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    let envs: Vec<(String, String)> = envs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    tokio::task::spawn_blocking(move || {
        let dir = tempfile::tempdir().unwrap();
        Command::new(BIN)
            .args(&args)
            .current_dir(dir.path())
            .env_remove("COHERE_API_KEY")
            .env_remove("OPENAI_API_KEY")
            .env_remove("RUST_LOG")
            .envs(envs)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

async fn cohere_server(template: ResponseTemplate) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .respond_with(template)
        .mount(&server)
        .await;
    server
}

fn cohere_reply(text: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "id": "test",
        "finish_reason": "COMPLETE",
        "message": {"role": "assistant", "content": [{"type": "text", "text": text}]}
    }))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_without_key_exits_1_naming_variable() {
    let output = sayr_bench(&["latency", "--iterations", "1"], &[]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("COHERE_API_KEY"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_without_key_reports_credential_stage() {
    let output = sayr_bench(&["verify"], &[]).await;
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("MATCH: Driver registered"));
    assert!(out.contains("CREDENTIAL ERROR: COHERE_API_KEY not found in environment"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_env_file_supplies_key() {
    let server = cohere_server(cohere_reply("Hello")).await;
    let dir = tempfile::tempdir().unwrap();
    let env_file = dir.path().join("bench.env");
    std::fs::write(&env_file, "COHERE_API_KEY=from-file-key\n").unwrap();
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &[
            "verify",
            "--env-file",
            env_file.to_str().unwrap(),
            "--base-url",
            &base_url,
        ],
        &[],
    )
    .await;
    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("Found COHERE_API_KEY: from..."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_all_failures_tolerant_exits_0_with_zero_mean() {
    let server = cohere_server(ResponseTemplate::new(500).set_body_string("unavailable")).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &["latency", "--iterations", "2", "--timeout", "5", "--base-url", &base_url],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("FAILED: cohere request failed with 500"));
    assert!(out.contains("Direct Average: 0.0000s (0/2 succeeded)"));
    assert!(out.contains("Agent Average: 0.0000s (0/2 succeeded)"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_fail_fast_exits_1() {
    let server = cohere_server(ResponseTemplate::new(503)).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &[
            "latency",
            "--iterations",
            "3",
            "--policy",
            "fail-fast",
            "--base-url",
            &base_url,
        ],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("503"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_json_report() {
    let server = cohere_server(cohere_reply("Hello")).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &["--output", "json", "latency", "--iterations", "2", "--base-url", &base_url],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["runner"], "latency");
    assert_eq!(report["policy"], "tolerant");
    assert_eq!(report["results"]["model"], "command-a-03-2025");

    let paths = report["results"]["paths"].as_array().unwrap();
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0]["path"], "direct");
    assert_eq!(paths[1]["path"], "agent");
    for summary in paths {
        assert_eq!(summary["succeeded"], 2);
        assert_eq!(summary["failed"], 0);
    }
    assert_eq!(server.received_requests().await.unwrap().len(), 4);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_live_call_failure_exits_1_with_detail() {
    let server = cohere_server(ResponseTemplate::new(500).set_body_string("internal")).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &["verify", "--base-url", &base_url],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("MATCH: Agent created successfully"));
    assert!(out.contains("CALL ERROR: cohere request failed with 500: internal"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_success_prints_response() {
    let server = cohere_server(cohere_reply("I am Command A.")).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &["verify", "--base-url", &base_url],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Found COHERE_API_KEY: test..."));
    assert!(out.contains("MATCH: Agent Response: I am Command A."));
    assert!(!out.contains("test-key"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cpu_json_report() {
    let output = sayr_bench(
        &[
            "--output",
            "json",
            "cpu",
            "--iterations",
            "2",
            "--fib-n",
            "15",
            "--words",
            "1000",
        ],
        &[],
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    let report: Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(report["runner"], "cpu");

    let results = report["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["workload"], "fibonacci(15)");
    assert_eq!(results[0]["baseline_output"], 610);
    assert!(results[0]["note"]
        .as_str()
        .unwrap()
        .contains("reference is recursive and native is iterative"));
    assert!(results[1].get("note").is_none());
    assert_eq!(results[1]["candidate_output"], 1000);
    assert_eq!(results[1]["outputs_agree"], true);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cpu_overflowing_input_exits_1() {
    let output = sayr_bench(&["cpu", "--fib-n", "94", "--workload", "fibonacci"], &[]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("overflows"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_cpu_oversized_corpus_exits_1() {
    let words = (usize::MAX / 2).to_string();
    let output = sayr_bench(&["cpu", "--workload", "tokens", "--words", &words], &[]).await;
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("too large"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_sampling_flags_reach_the_wire() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/chat"))
        .and(body_partial_json(json!({"temperature": 0.5, "max_tokens": 16})))
        .respond_with(cohere_reply("Hello"))
        .expect(2)
        .mount(&server)
        .await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &[
            "latency",
            "--iterations",
            "1",
            "--temperature",
            "0.5",
            "--max-tokens",
            "16",
            "--base-url",
            &base_url,
        ],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(0), "stderr: {}", stderr(&output));
    assert!(stdout(&output).contains("(1/1 succeeded)"));
    server.verify().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn test_verify_malformed_endpoint_reports_model_stage() {
    let output = sayr_bench(
        &["verify", "--base-url", "not a url"],
        &[("COHERE_API_KEY", "test-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("MATCH: Found COHERE_API_KEY: test..."));
    assert!(out.contains("MODEL ERROR: Configuration error: Invalid Cohere endpoint 'not a url'"));
    assert!(!out.contains("Agent created"));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_latency_rejected_key_aborts_tolerant_run() {
    let server = cohere_server(ResponseTemplate::new(401).set_body_string("invalid api token")).await;
    let base_url = format!("{}/v2/chat", server.uri());

    let output = sayr_bench(
        &["latency", "--iterations", "3", "--base-url", &base_url],
        &[("COHERE_API_KEY", "revoked-key")],
    )
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("cohere rejected the API key with 401"));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}
