// Balance snapshot tests against a local mock JSON-RPC node: completeness
// under partial failure and wholesale replacement between fetches.

use parking_lot::Mutex;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_sdk::pubkey::Pubkey;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use wagus_swap::{default_catalog, BalanceLoader, TokenBalance};

struct MockRpc {
    addr: SocketAddr,
    deny_native: Arc<AtomicBool>,
    methods: Arc<Mutex<Vec<String>>>,
}

impl MockRpc {
    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Answers `getBalance` with 5 SOL and `getAccountInfo` with a null account.
/// While `deny_native` is set, `getBalance` is rejected with 403 instead.
async fn spawn_rpc() -> MockRpc {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let deny_native = Arc::new(AtomicBool::new(false));
    let methods = Arc::new(Mutex::new(Vec::new()));

    let deny = deny_native.clone();
    let seen = methods.clone();
    tokio::spawn(async move {
        loop {
            let (mut socket, _) = match listener.accept().await {
                Ok(conn) => conn,
                Err(_) => return,
            };
            let deny = deny.clone();
            let seen = seen.clone();
            tokio::spawn(async move {
                let request = read_request(&mut socket).await;
                let response = if request.contains("getBalance") {
                    seen.lock().push("getBalance".to_string());
                    if deny.load(Ordering::SeqCst) {
                        "HTTP/1.1 403 Forbidden\r\ncontent-length: 0\r\nconnection: close\r\n\r\n"
                            .to_string()
                    } else {
                        json_response(
                            r#"{"jsonrpc":"2.0","result":{"context":{"apiVersion":"2.2.1","slot":1},"value":5000000000},"id":1}"#,
                        )
                    }
                } else {
                    seen.lock().push("getAccountInfo".to_string());
                    json_response(
                        r#"{"jsonrpc":"2.0","result":{"context":{"apiVersion":"2.2.1","slot":1},"value":null},"id":1}"#,
                    )
                };
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockRpc {
        addr,
        deny_native,
        methods,
    }
}

fn json_response(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

async fn read_request(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);
        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[tokio::test(flavor = "multi_thread")]
async fn test_snapshot_is_complete_and_replaced_wholesale() {
    let rpc = spawn_rpc().await;
    let loader = BalanceLoader::new(Arc::new(RpcClient::new(rpc.url())));
    let wallet = Pubkey::new_unique();
    let catalog = default_catalog();

    // Healthy node: SOL resolves, the WAGUS associated account does not
    // exist yet and reads as a confirmed zero.
    let snapshot = loader.fetch_all(&wallet, &catalog).await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("SOL"), Some(&TokenBalance::Known(5.0)));
    assert_eq!(snapshot.get("WAGUS"), Some(&TokenBalance::Known(0.0)));
    assert!(!loader.is_loading());

    // Native lookups start failing: the SOL entry turns unknown, the WAGUS
    // entry still resolves, and the snapshot stays complete. The earlier
    // 5 SOL value must not linger.
    rpc.deny_native.store(true, Ordering::SeqCst);
    let snapshot = loader.fetch_all(&wallet, &catalog).await;
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot.get("SOL"), Some(&TokenBalance::Unknown));
    assert_eq!(snapshot.get("WAGUS"), Some(&TokenBalance::Known(0.0)));
    assert_eq!(loader.balance_of("SOL"), 0.0);

    let methods = rpc.methods.lock().clone();
    assert!(methods.iter().any(|m| m == "getBalance"));
    assert!(methods.iter().any(|m| m == "getAccountInfo"));
}
