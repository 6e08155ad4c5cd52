use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use axum::extract::{Path as UrlPath, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use num_bigint::BigUint;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use tempfile::TempDir;

use skiptrade::config::{load_config, AppConfig};
use skiptrade::models::tokens::TokenRegistry;
use skiptrade::services::executor::ExecutionStatus;
use skiptrade::services::notify::{DisabledNotifier, Notifier, TelegramNotifier};
use skiptrade::services::route::SkipRouteClient;
use skiptrade::services::swap::{run_swap, SwapError, SwapErrorKind, SwapIntent, SwapReport};

type Captured = Arc<Mutex<Vec<Value>>>;

#[derive(Clone)]
struct SkipMock {
    status: StatusCode,
    body: Value,
    requests: Captured,
}

async fn skip_route(State(mock): State<SkipMock>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    mock.requests.lock().unwrap().push(body);
    (mock.status, Json(mock.body.clone()))
}

async fn telegram_send(
    State(messages): State<Captured>,
    UrlPath(bot_segment): UrlPath<String>,
    Json(mut body): Json<Value>,
) -> Json<Value> {
    body["bot_segment"] = Value::String(bot_segment);
    messages.lock().unwrap().push(body);
    Json(json!({"ok": true}))
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service()).await.unwrap();
    });
    addr
}

async fn start_skip(status: StatusCode, body: Value) -> (String, Captured) {
    let requests: Captured = Arc::default();
    let app = Router::new().route("/v2/fungible/route", post(skip_route)).with_state(SkipMock {
        status,
        body,
        requests: Arc::clone(&requests),
    });
    let addr = serve(app).await;
    (format!("http://{}/v2/fungible/route", addr), requests)
}

async fn start_telegram() -> (String, Captured) {
    let messages: Captured = Arc::default();
    let app = Router::new()
        .route("/:bot_segment/sendMessage", post(telegram_send))
        .with_state(Arc::clone(&messages));
    let addr = serve(app).await;
    (format!("http://{}", addr), messages)
}

fn atom_osmo_route() -> Value {
    json!({
        "estimated_amount_out": "9800000",
        "swap_price_impact_percent": "0.12",
        "operations": [
            {"transfer": {"port": "transfer", "channel": "channel-0"}},
            {"swap": {"swap_in": {
                "swap_venue": {"name": "osmosis-poolmanager", "chain_id": "osmosis-1"},
                "swap_operations": [{"pool": 1, "denom_in": "uatom", "denom_out": "uosmo"}]
            }}}
        ]
    })
}

struct Harness {
    dir: TempDir,
    config: AppConfig,
    registry: TokenRegistry,
}

impl Harness {
    fn new(skip_url: &str, chain_binary: &str, telegram_url: Option<&str>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let assets = dir.path().join("assets.json");
        std::fs::write(
            &assets,
            json!({
                "pool_1": {
                    "token_name_1": "ATOM", "token_name_2": "OSMO",
                    "denom_1": "uatom", "denom_2": "uosmo",
                    "divisor_denom_1": 1000000, "divisor_denom_2": 1000000
                },
                "pool_678": {
                    "token_name_1": "OSMO", "token_name_2": "USDC",
                    "denom_1": "uosmo", "denom_2": "ibc/USDC",
                    "divisor_denom_1": 1000000, "divisor_denom_2": 1000000
                }
            })
            .to_string(),
        )
        .unwrap();

        let mut config = json!({
            "assets_config_path": assets,
            "command_output_path": dir.path().join("command.txt"),
            "log_file_path": dir.path().join("skiptrade.log"),
            "chain_id": "osmosis-1",
            "chain_binary": chain_binary,
            "gas_adjustment": 1.5,
            "fees": 5000,
            "gas_token": "uosmo",
            "slippage_percent": 1.5,
            "account_name": "trader",
            "account_password": "hunter2",
            "account_address": "osmo1trader",
            "skip_api_url": skip_url,
            "route_timeout_ms": 2000,
            "chain_client_timeout_secs": 10
        });
        if let Some(url) = telegram_url {
            let bots = dir.path().join("bots.json");
            std::fs::write(
                &bots,
                json!({
                    "bots": [{"username": "swap_bot", "token": "123:abc"}],
                    "users": [
                        {"username": "alice", "id": 1001},
                        {"username": "bob", "id": "1002"}
                    ]
                })
                .to_string(),
            )
            .unwrap();
            config["telegram_bot_username"] = json!("swap_bot");
            config["telegram_usernames"] = json!(["alice", "bob"]);
            config["bot_config_path"] = json!(bots);
            config["telegram_api_url"] = json!(url);
        }
        let config_path = dir.path().join("config_skiptrade.json");
        std::fs::write(&config_path, config.to_string()).unwrap();

        let config = load_config(&config_path).unwrap();
        let registry = TokenRegistry::load(&config.assets_config_path).unwrap();
        Self {
            dir,
            config,
            registry,
        }
    }

    fn sink(&self) -> &Path {
        &self.config.command_output_path
    }

    #[cfg(unix)]
    fn script(&self, body: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;

        let path = self.dir.path().join("fake-osmosisd");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    async fn run(&self, intent: &SwapIntent) -> Result<SwapReport, SwapError> {
        let resolver = SkipRouteClient::new(
            self.config.skip_api_url.clone(),
            self.config.skip_api_key.clone(),
            self.config.route_timeout,
        )
        .unwrap();
        let notifier: Box<dyn Notifier> = match &self.config.telegram {
            Some(telegram) => Box::new(TelegramNotifier::new(telegram).unwrap()),
            None => Box::new(DisabledNotifier),
        };
        run_swap(
            &self.config,
            &self.registry,
            &resolver,
            notifier.as_ref(),
            intent,
        )
        .await
    }
}

fn intent(dry_run: bool) -> SwapIntent {
    SwapIntent {
        token_from: "ATOM".to_string(),
        token_to: "OSMO".to_string(),
        amount: dec!(10),
        dry_run,
        ..SwapIntent::default()
    }
}

#[tokio::test]
async fn dry_run_saves_command_without_notifying() {
    let (skip_url, requests) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let (telegram_url, messages) = start_telegram().await;
    let harness = Harness::new(&skip_url, "osmosisd", Some(&telegram_url));

    let report = harness.run(&intent(true)).await.unwrap();

    let rendered = report.command.to_string();
    assert!(rendered.starts_with("osmosisd tx gamm swap-exact-amount-in 10000000uatom 9653000"));
    assert!(rendered.contains("--swap-route-pool-ids 1 --swap-route-denoms uosmo"));
    assert!(rendered.contains("--from osmo1trader"));
    assert!(rendered.ends_with("-y"));
    assert_eq!(report.minimum_amount_out, BigUint::from(9_653_000u64));
    assert_eq!(report.outcome.status, ExecutionStatus::DryRun);
    assert!(!report.notified);
    assert!(messages.lock().unwrap().is_empty());
    assert_eq!(
        std::fs::read_to_string(harness.sink()).unwrap(),
        format!("{}\n", rendered)
    );

    let requests = requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["amount_in"], "10000000");
    assert_eq!(requests[0]["source_asset_denom"], "uatom");
    assert_eq!(requests[0]["dest_asset_denom"], "uosmo");
    assert_eq!(requests[0]["source_asset_chain_id"], "osmosis-1");
}

#[tokio::test]
async fn split_and_venue_flags_reach_the_request() {
    let (skip_url, requests) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let harness = Harness::new(&skip_url, "osmosisd", None);
    let mut intent = intent(true);
    intent.split_routes = true;
    intent.only_osmosis = true;

    harness.run(&intent).await.unwrap();

    let requests = requests.lock().unwrap();
    assert_eq!(requests[0]["smart_swap_options"]["split_routes"], true);
    assert_eq!(requests[0]["swap_venues"][0]["name"], "osmosis-poolmanager");
    assert_eq!(requests[0]["swap_venues"][0]["chain_id"], "osmosis-1");
}

#[tokio::test]
async fn route_not_found_is_reported() {
    let (skip_url, _) = start_skip(StatusCode::NOT_FOUND, json!({"message": "no route"})).await;
    let harness = Harness::new(&skip_url, "osmosisd", None);

    let err = harness.run(&intent(true)).await.unwrap_err();
    assert_eq!(err.kind(), SwapErrorKind::RouteUnavailable);
    assert_eq!(err.message(), "No route found from ATOM to OSMO");
    assert!(!harness.sink().exists());
}

#[tokio::test]
async fn server_error_is_reported_as_missing_route() {
    let (skip_url, _) = start_skip(StatusCode::INTERNAL_SERVER_ERROR, json!({"error": "boom"})).await;
    let harness = Harness::new(&skip_url, "osmosisd", None);

    let err = harness.run(&intent(true)).await.unwrap_err();
    assert_eq!(err.kind(), SwapErrorKind::RouteUnavailable);
}

#[tokio::test]
async fn route_without_swap_writes_nothing() {
    let (skip_url, _) = start_skip(
        StatusCode::OK,
        json!({
            "estimated_amount_out": "9800000",
            "operations": [{"transfer": {"port": "transfer", "channel": "channel-0"}}]
        }),
    )
    .await;
    let harness = Harness::new(&skip_url, "osmosisd", None);

    let err = harness.run(&intent(true)).await.unwrap_err();
    assert_eq!(err.kind(), SwapErrorKind::CommandBuild);
    assert!(!harness.sink().exists());
}

#[tokio::test]
async fn unknown_token_makes_no_request() {
    let (skip_url, requests) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let harness = Harness::new(&skip_url, "osmosisd", None);
    let mut intent = intent(true);
    intent.token_from = "DOGE".to_string();

    let err = harness.run(&intent).await.unwrap_err();
    assert_eq!(err.kind(), SwapErrorKind::UnknownToken);
    assert!(requests.lock().unwrap().is_empty());
}

#[tokio::test]
async fn pre_check_rejects_excessive_price_impact() {
    let mut route = atom_osmo_route();
    route["swap_price_impact_percent"] = json!("3.2");
    let (skip_url, _) = start_skip(StatusCode::OK, route).await;
    let harness = Harness::new(&skip_url, "osmosisd", None);
    let mut intent = intent(true);
    intent.pre_check = true;

    let err = harness.run(&intent).await.unwrap_err();
    assert_eq!(err.kind(), SwapErrorKind::SlippageRejected);
    assert!(!harness.sink().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn failed_submission_does_not_notify() {
    let (skip_url, _) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let (telegram_url, messages) = start_telegram().await;
    let harness = Harness::new(&skip_url, "false", Some(&telegram_url));

    let report = harness.run(&intent(false)).await.unwrap();

    assert!(matches!(report.outcome.status, ExecutionStatus::Failed { .. }));
    assert_eq!(report.outcome.tx_hash, None);
    assert!(!report.notified);
    assert!(messages.lock().unwrap().is_empty());
    assert!(report.command.to_string().contains("--from trader"));
}

#[cfg(unix)]
#[tokio::test]
async fn confirmed_submission_notifies_every_recipient() {
    let (skip_url, _) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let (telegram_url, messages) = start_telegram().await;
    let mut harness = Harness::new(&skip_url, "osmosisd", Some(&telegram_url));
    let script = harness.script(
        r#"read pw
if [ "$pw" != "hunter2" ]; then echo "bad passphrase" >&2; exit 2; fi
echo "code: 0"
echo "txhash: 5E0A1B2C3D4F""#,
    );
    harness.config.chain_binary = script.display().to_string();

    let report = harness.run(&intent(false)).await.unwrap();

    assert_eq!(report.outcome.status, ExecutionStatus::Confirmed);
    assert_eq!(report.outcome.tx_hash.as_deref(), Some("5E0A1B2C3D4F"));
    assert!(report.notified);

    let messages = messages.lock().unwrap();
    assert_eq!(messages.len(), 2);
    let chats: Vec<&str> = messages.iter().map(|m| m["chat_id"].as_str().unwrap()).collect();
    assert_eq!(chats, vec!["1001", "1002"]);
    for message in messages.iter() {
        assert_eq!(message["bot_segment"], "bot123:abc");
        assert_eq!(message["parse_mode"], "Markdown");
        let text = message["text"].as_str().unwrap();
        assert!(text.contains("*TxHash:* `5E0A1B2C3D4F`"));
        assert!(text.contains("*Sender:* `osmo1trader`"));
        assert!(text.contains("*Pools:* `1`"));
    }
}

#[cfg(unix)]
#[tokio::test]
async fn confirmed_submission_without_bot_is_not_reported_as_notified() {
    let (skip_url, _) = start_skip(StatusCode::OK, atom_osmo_route()).await;
    let mut harness = Harness::new(&skip_url, "osmosisd", None);
    let script = harness.script("read pw\necho \"txhash: 77AA\"");
    harness.config.chain_binary = script.display().to_string();

    let report = harness.run(&intent(false)).await.unwrap();

    assert_eq!(report.outcome.tx_hash.as_deref(), Some("77AA"));
    assert!(!report.notified);
}
