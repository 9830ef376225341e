//! In-process RESP2 server for exercising the Redis backends
//!
//! Speaks just enough of the protocol for the commands this crate sends:
//! strings, lists with a blocking BLPOP, MULTI/EXEC, SCAN, pub/sub and the
//! queue's two scripts. Scripts are told apart by their key count, since the
//! server never runs Lua.

use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;

type Frame = Vec<u8>;

#[derive(Default)]
struct Data {
    strings: HashMap<String, Vec<u8>>,
    lists: HashMap<String, VecDeque<Vec<u8>>>,
    subscribers: HashMap<String, Vec<(u64, mpsc::UnboundedSender<Frame>)>>,
}

#[derive(Default)]
struct State {
    data: Mutex<Data>,
    pushed: Notify,
    next_conn: AtomicU64,
}

pub(crate) struct FakeRedis {
    addr: SocketAddr,
    state: Arc<State>,
    task: JoinHandle<()>,
}

impl FakeRedis {
    pub(crate) async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(State::default());

        let accept_state = Arc::clone(&state);
        let task = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&accept_state)));
            }
        });

        Self { addr, state, task }
    }

    pub(crate) fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub(crate) fn subscriber_count(&self, channel: &str) -> usize {
        self.state
            .data
            .lock()
            .subscribers
            .get(channel)
            .map_or(0, Vec::len)
    }

    pub(crate) fn list_len(&self, key: &str) -> usize {
        self.state.data.lock().lists.get(key).map_or(0, VecDeque::len)
    }

    pub(crate) fn has_string(&self, key: &str) -> bool {
        self.state.data.lock().strings.contains_key(key)
    }
}

impl Drop for FakeRedis {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, state: Arc<State>) {
    let conn_id = state.next_conn.fetch_add(1, Ordering::SeqCst);
    let (read, mut write) = stream.into_split();
    let mut reader = BufReader::new(read);

    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Frame>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = out_rx.recv().await {
            if write.write_all(&frame).await.is_err() {
                break;
            }
        }
    });

    let mut queued: Option<Vec<Vec<Vec<u8>>>> = None;
    while let Some(args) = read_command(&mut reader).await {
        let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
        let reply = if name == "MULTI" {
            queued = Some(Vec::new());
            simple("OK")
        } else if name == "EXEC" {
            let mut replies = Vec::new();
            for command in queued.take().unwrap_or_default() {
                replies.push(execute(&state, conn_id, &out_tx, command).await);
            }
            array(replies)
        } else if let Some(pending) = queued.as_mut() {
            pending.push(args);
            simple("QUEUED")
        } else {
            execute(&state, conn_id, &out_tx, args).await
        };
        if out_tx.send(reply).is_err() {
            break;
        }
    }

    let mut data = state.data.lock();
    for subscribers in data.subscribers.values_mut() {
        subscribers.retain(|(id, _)| *id != conn_id);
    }
    data.subscribers.retain(|_, subscribers| !subscribers.is_empty());
    drop(data);
    writer.abort();
}

async fn read_command(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>) -> Option<Vec<Vec<u8>>> {
    let count = read_header(reader, b'*').await?;
    let mut args = Vec::with_capacity(count);
    for _ in 0..count {
        let len = read_header(reader, b'$').await?;
        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await.ok()?;
        buf.truncate(len);
        args.push(buf);
    }
    Some(args)
}

async fn read_header(reader: &mut BufReader<tokio::net::tcp::OwnedReadHalf>, marker: u8) -> Option<usize> {
    let mut line = String::new();
    if reader.read_line(&mut line).await.ok()? == 0 {
        return None;
    }
    let line = line.trim_end();
    if line.as_bytes().first() != Some(&marker) {
        return None;
    }
    line[1..].parse().ok()
}

async fn execute(
    state: &State,
    conn_id: u64,
    out: &mpsc::UnboundedSender<Frame>,
    args: Vec<Vec<u8>>,
) -> Frame {
    let name = String::from_utf8_lossy(&args[0]).to_ascii_uppercase();
    let text = |i: usize| String::from_utf8_lossy(&args[i]).into_owned();

    match name.as_str() {
        "PING" => simple("PONG"),
        "CLIENT" | "SELECT" => simple("OK"),
        "SCRIPT" => bulk(Some(b"0000000000000000000000000000000000000000".as_slice())),
        "GET" => bulk(state.data.lock().strings.get(&text(1)).map(Vec::as_slice)),
        "SET" => {
            let key = text(1);
            let nx = args[3..]
                .iter()
                .any(|a| a.eq_ignore_ascii_case(b"NX"));
            let mut data = state.data.lock();
            if nx && data.strings.contains_key(&key) {
                return bulk(None);
            }
            data.lists.remove(&key);
            data.strings.insert(key, args[2].clone());
            simple("OK")
        }
        "DEL" | "UNLINK" => {
            let mut data = state.data.lock();
            let removed = (1..args.len())
                .filter(|&i| {
                    let key = text(i);
                    data.strings.remove(&key).is_some() | data.lists.remove(&key).is_some()
                })
                .count();
            int(removed as i64)
        }
        "EXISTS" => {
            let data = state.data.lock();
            let found = (1..args.len())
                .filter(|&i| {
                    let key = text(i);
                    data.strings.contains_key(&key) || data.lists.contains_key(&key)
                })
                .count();
            int(found as i64)
        }
        "RPUSH" | "LPUSH" => {
            let key = text(1);
            let mut data = state.data.lock();
            if data.strings.contains_key(&key) {
                return wrong_type();
            }
            let list = data.lists.entry(key).or_default();
            for value in &args[2..] {
                if name == "RPUSH" {
                    list.push_back(value.clone());
                } else {
                    list.push_front(value.clone());
                }
            }
            let len = list.len();
            drop(data);
            state.pushed.notify_waiters();
            int(len as i64)
        }
        "LTRIM" => {
            let key = text(1);
            let (start, stop) = (parse_index(&text(2)), parse_index(&text(3)));
            let mut data = state.data.lock();
            if let Some(list) = data.lists.get_mut(&key) {
                let kept: VecDeque<Vec<u8>> = slice(list, start, stop).into_iter().collect();
                *list = kept;
            }
            simple("OK")
        }
        "LRANGE" => {
            let key = text(1);
            let (start, stop) = (parse_index(&text(2)), parse_index(&text(3)));
            let data = state.data.lock();
            let items = data
                .lists
                .get(&key)
                .map(|list| slice(list, start, stop))
                .unwrap_or_default();
            array(items.iter().map(|item| bulk(Some(item))).collect())
        }
        "BLPOP" => {
            let keys: Vec<String> = (1..args.len() - 1).map(text).collect();
            let seconds: f64 = text(args.len() - 1).parse().unwrap_or(0.0);
            let deadline = (seconds > 0.0)
                .then(|| tokio::time::Instant::now() + Duration::from_secs_f64(seconds));
            loop {
                let notified = state.pushed.notified();
                if let Some((key, value)) = pop_first(state, &keys) {
                    return array(vec![bulk(Some(key.as_bytes())), bulk(Some(&value))]);
                }
                match deadline {
                    Some(deadline) => {
                        if tokio::time::timeout_at(deadline, notified).await.is_err() {
                            return null_array();
                        }
                    }
                    None => notified.await,
                }
            }
        }
        "SCAN" => {
            let pattern = args
                .iter()
                .position(|a| a.eq_ignore_ascii_case(b"MATCH"))
                .map(|i| text(i + 1))
                .unwrap_or_else(|| "*".to_string());
            let prefix = pattern.trim_end_matches('*');
            let data = state.data.lock();
            let keys: Vec<Frame> = data
                .strings
                .keys()
                .chain(data.lists.keys())
                .filter(|key| key.starts_with(prefix))
                .map(|key| bulk(Some(key.as_bytes())))
                .collect();
            array(vec![bulk(Some(b"0".as_slice())), array(keys)])
        }
        "EVALSHA" | "EVAL" => run_script(state, &args),
        "PUBLISH" => {
            let channel = text(1);
            let message = array(vec![
                bulk(Some(b"message".as_slice())),
                bulk(Some(channel.as_bytes())),
                bulk(Some(&args[2])),
            ]);
            let data = state.data.lock();
            let delivered = data
                .subscribers
                .get(&channel)
                .map_or(0, |subscribers| {
                    subscribers
                        .iter()
                        .filter(|(_, tx)| tx.send(message.clone()).is_ok())
                        .count()
                });
            int(delivered as i64)
        }
        "SUBSCRIBE" => {
            let mut data = state.data.lock();
            let mut confirmations = Vec::new();
            for (n, i) in (1..args.len()).enumerate() {
                let channel = text(i);
                data.subscribers
                    .entry(channel.clone())
                    .or_default()
                    .push((conn_id, out.clone()));
                confirmations.push(array(vec![
                    bulk(Some(b"subscribe".as_slice())),
                    bulk(Some(channel.as_bytes())),
                    int(n as i64 + 1),
                ]));
            }
            // Every confirmation but the last goes out ahead of the reply
            let last = confirmations.pop().unwrap_or_else(|| simple("OK"));
            for frame in confirmations {
                let _ = out.send(frame);
            }
            last
        }
        _ => error(&format!("ERR unknown command '{}'", name)),
    }
}

/// SUBMIT: 2 keys (pending marker, job list). COMPLETE: 1 key (pending marker).
fn run_script(state: &State, args: &[Vec<u8>]) -> Frame {
    let text = |i: usize| String::from_utf8_lossy(&args[i]).into_owned();
    let numkeys: usize = text(2).parse().unwrap_or(0);
    let keys: Vec<String> = (3..3 + numkeys).map(text).collect();
    let argv = &args[3 + numkeys..];

    let mut data = state.data.lock();
    match numkeys {
        2 => {
            if data.strings.contains_key(&keys[0]) {
                return int(0);
            }
            if data.strings.contains_key(&keys[1]) {
                return wrong_type();
            }
            data.strings.insert(keys[0].clone(), argv[0].clone());
            data.lists
                .entry(keys[1].clone())
                .or_default()
                .push_back(argv[2].clone());
            drop(data);
            state.pushed.notify_waiters();
            int(1)
        }
        1 => {
            if data.strings.get(&keys[0]) == Some(&argv[0]) {
                data.strings.remove(&keys[0]);
                int(1)
            } else {
                int(0)
            }
        }
        _ => error("ERR unexpected script"),
    }
}

fn pop_first(state: &State, keys: &[String]) -> Option<(String, Vec<u8>)> {
    let mut data = state.data.lock();
    for key in keys {
        if let Some(list) = data.lists.get_mut(key) {
            if let Some(value) = list.pop_front() {
                if list.is_empty() {
                    data.lists.remove(key);
                }
                return Some((key.clone(), value));
            }
        }
    }
    None
}

fn parse_index(raw: &str) -> i64 {
    raw.parse().unwrap_or(0)
}

fn slice(list: &VecDeque<Vec<u8>>, start: i64, stop: i64) -> Vec<Vec<u8>> {
    let len = list.len() as i64;
    let resolve = |i: i64| if i < 0 { (len + i).max(0) } else { i };
    let (start, stop) = (resolve(start), resolve(stop).min(len - 1));
    if len == 0 || start > stop {
        return Vec::new();
    }
    list.iter()
        .skip(start as usize)
        .take((stop - start + 1) as usize)
        .cloned()
        .collect()
}

fn simple(s: &str) -> Frame {
    format!("+{}\r\n", s).into_bytes()
}

fn error(s: &str) -> Frame {
    format!("-{}\r\n", s).into_bytes()
}

fn wrong_type() -> Frame {
    error("WRONGTYPE Operation against a key holding the wrong kind of value")
}

fn int(n: i64) -> Frame {
    format!(":{}\r\n", n).into_bytes()
}

fn bulk(value: Option<&[u8]>) -> Frame {
    match value {
        Some(bytes) => {
            let mut frame = format!("${}\r\n", bytes.len()).into_bytes();
            frame.extend_from_slice(bytes);
            frame.extend_from_slice(b"\r\n");
            frame
        }
        None => b"$-1\r\n".to_vec(),
    }
}

fn array(items: Vec<Frame>) -> Frame {
    let mut frame = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        frame.extend(item);
    }
    frame
}

fn null_array() -> Frame {
    b"*-1\r\n".to_vec()
}
