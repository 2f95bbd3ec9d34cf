// In-process FTP server driving the transfer tests. Files live in memory,
// every control connection and every command is recorded.
use std::collections::HashMap;
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::OwnedWriteHalf;
use tokio::net::{TcpListener, TcpStream};

pub const TEST_USER: &str = "rouille";
pub const TEST_PASSWORD: &str = "secret";

#[derive(Clone, Default)]
struct ServerState {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    commands: Arc<Mutex<Vec<String>>>,
    canned: Arc<Mutex<HashMap<String, String>>>,
    connections: Arc<AtomicUsize>,
}

pub struct TestServer {
    pub addr: SocketAddr,
    state: ServerState,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = ServerState::default();

        let shared = state.clone();
        tokio::spawn(async move {
            while let Ok((socket, _)) = listener.accept().await {
                shared.connections.fetch_add(1, Ordering::SeqCst);
                let session_state = shared.clone();
                tokio::spawn(async move {
                    let _ = serve_control(socket, session_state).await;
                });
            }
        });

        Self { addr, state }
    }

    pub fn put_file(&self, name: &str, contents: &[u8]) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(name.to_string(), contents.to_vec());
    }

    pub fn file(&self, name: &str) -> Option<Vec<u8>> {
        self.state.files.lock().unwrap().get(name).cloned()
    }

    /// Answers every later `verb` with `line` instead of handling it. Any
    /// negotiated data connection is dropped.
    pub fn answer(&self, verb: &str, line: &str) {
        self.state
            .canned
            .lock()
            .unwrap()
            .insert(verb.to_string(), line.to_string());
    }

    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    /// Number of commands received with the given verb, over all sessions.
    pub fn received(&self, verb: &str) -> usize {
        self.state
            .commands
            .lock()
            .unwrap()
            .iter()
            .filter(|line| line.split(' ').next() == Some(verb))
            .count()
    }
}

enum PendingData {
    None,
    Passive(TcpListener),
    Active(SocketAddr),
}

async fn open_data(pending: &mut PendingData) -> io::Result<TcpStream> {
    match std::mem::replace(pending, PendingData::None) {
        PendingData::Passive(listener) => Ok(listener.accept().await?.0),
        PendingData::Active(addr) => TcpStream::connect(addr).await,
        PendingData::None => Err(io::Error::new(
            io::ErrorKind::NotConnected,
            "no data connection negotiated",
        )),
    }
}

fn parse_port_argument(arg: &str) -> Option<SocketAddr> {
    let parts: Vec<u8> = arg
        .split(',')
        .map(|x| x.trim().parse::<u8>())
        .collect::<Result<_, _>>()
        .ok()?;
    if parts.len() != 6 {
        return None;
    }
    let ip = Ipv4Addr::new(parts[0], parts[1], parts[2], parts[3]);
    let port = (parts[4] as u16) << 8 | parts[5] as u16;
    Some(SocketAddr::V4(SocketAddrV4::new(ip, port)))
}

async fn reply(writer: &mut OwnedWriteHalf, line: &str) -> io::Result<()> {
    writer.write_all(format!("{}\r\n", line).as_bytes()).await
}

async fn serve_control(socket: TcpStream, state: ServerState) -> io::Result<()> {
    let (reader, mut writer) = socket.into_split();
    let mut lines = BufReader::new(reader).lines();
    writer
        .write_all(b"220-rouilleftp test server\r\n220 Ready.\r\n")
        .await?;

    let mut pending = PendingData::None;
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end().to_string();
        state.commands.lock().unwrap().push(line.clone());

        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.to_string()),
            None => (line.to_ascii_uppercase(), String::new()),
        };

        let canned = state.canned.lock().unwrap().get(&verb).cloned();
        if let Some(line) = canned {
            pending = PendingData::None;
            reply(&mut writer, &line).await?;
            continue;
        }

        match verb.as_str() {
            "USER" => reply(&mut writer, "331 Password required.").await?,
            "PASS" if arg == TEST_PASSWORD => reply(&mut writer, "230 Logged in.").await?,
            "PASS" => reply(&mut writer, "530 Login incorrect.").await?,
            "PASV" => {
                let listener = TcpListener::bind("127.0.0.1:0").await?;
                let port = listener.local_addr()?.port();
                pending = PendingData::Passive(listener);
                let response = format!(
                    "227 Entering Passive Mode (127,0,0,1,{},{}).",
                    port / 256,
                    port % 256
                );
                reply(&mut writer, &response).await?;
            }
            "PORT" => match parse_port_argument(&arg) {
                Some(addr) => {
                    pending = PendingData::Active(addr);
                    reply(&mut writer, "200 PORT command successful.").await?;
                }
                None => reply(&mut writer, "501 Syntax error in parameters.").await?,
            },
            "RETR" => {
                let contents = state.files.lock().unwrap().get(&arg).cloned();
                match contents {
                    Some(contents) => {
                        reply(&mut writer, "150 Opening data connection.").await?;
                        let mut data = open_data(&mut pending).await?;
                        data.write_all(&contents).await?;
                        data.shutdown().await?;
                        reply(&mut writer, "226 Transfer complete.").await?;
                    }
                    None => {
                        pending = PendingData::None;
                        reply(&mut writer, "550 File not found.").await?;
                    }
                }
            }
            "STOR" => {
                reply(&mut writer, "150 Ok to send data.").await?;
                let mut data = open_data(&mut pending).await?;
                let mut contents = Vec::new();
                data.read_to_end(&mut contents).await?;
                state.files.lock().unwrap().insert(arg, contents);
                reply(&mut writer, "226 Transfer complete.").await?;
            }
            "LIST" => {
                reply(&mut writer, "150 Here comes the directory listing.").await?;
                let mut data = open_data(&mut pending).await?;
                let mut names: Vec<String> = state.files.lock().unwrap().keys().cloned().collect();
                names.sort();
                for name in names {
                    data.write_all(format!("{}\r\n", name).as_bytes()).await?;
                }
                data.shutdown().await?;
                reply(&mut writer, "226 Directory send OK.").await?;
            }
            "PWD" => reply(&mut writer, "257 \"/\" is the current directory.").await?,
            "QUIT" => {
                reply(&mut writer, "221 Goodbye.").await?;
                return Ok(());
            }
            _ => reply(&mut writer, "502 Command not implemented.").await?,
        }
    }
    Ok(())
}
