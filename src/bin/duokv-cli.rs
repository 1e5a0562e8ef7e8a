use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use duokv::config::{DEFAULT_TCP_PORT, DEFAULT_UDP_PORT};

struct Target {
    host: String,
    tcp_port: u16,
    udp_port: u16,
    timeout: Duration,
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let mut target = Target {
        host: "127.0.0.1".to_string(),
        tcp_port: DEFAULT_TCP_PORT,
        udp_port: DEFAULT_UDP_PORT,
        timeout: Duration::from_millis(5000),
    };

    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" | "-h" => {
                if i + 1 < args.len() {
                    target.host = args[i + 1].clone();
                    i += 1;
                }
            }
            "--tcp-port" => {
                if i + 1 < args.len() {
                    if let Ok(p) = args[i + 1].parse() {
                        target.tcp_port = p;
                    }
                    i += 1;
                }
            }
            "--udp-port" => {
                if i + 1 < args.len() {
                    if let Ok(p) = args[i + 1].parse() {
                        target.udp_port = p;
                    }
                    i += 1;
                }
            }
            "--timeout-ms" => {
                if i + 1 < args.len() {
                    if let Ok(ms) = args[i + 1].parse() {
                        target.timeout = Duration::from_millis(ms);
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }

    eprintln!(
        "Talking to {host} (tcp {tcp}, udp {udp}). Type 'quit' to leave, 'exit' stops the server.",
        host = target.host,
        tcp = target.tcp_port,
        udp = target.udp_port,
    );

    let stdin = io::stdin();
    let mut reader = stdin.lock();

    loop {
        print!("duokv> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            break; // EOF
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("quit") {
            break;
        }

        // A single shutdown request is enough, so `exit` only goes over TCP.
        if line.eq_ignore_ascii_case("exit") {
            report("TCP", tcp_round_trip(&target, line).await);
            break;
        }

        let (tcp, udp) = tokio::join!(tcp_round_trip(&target, line), udp_round_trip(&target, line));
        report("TCP", tcp);
        report("UDP", udp);
    }

    Ok(())
}

fn report(transport: &str, result: io::Result<(String, Duration)>) {
    match result {
        Ok((response, elapsed)) => {
            println!("[{transport}] {response}");
            println!("[{transport}] round trip: {} ms", elapsed.as_millis());
        }
        Err(e) => println!("[{transport}] (error) {e}"),
    }
}

async fn tcp_round_trip(target: &Target, line: &str) -> io::Result<(String, Duration)> {
    let exchange = async {
        let mut stream = TcpStream::connect((target.host.as_str(), target.tcp_port)).await?;
        let start = Instant::now();
        stream.write_all(format!("{line}\n").as_bytes()).await?;

        let mut reader = BufReader::new(stream);
        let mut response = String::new();
        if reader.read_line(&mut response).await? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed by server",
            ));
        }
        let elapsed = start.elapsed();
        Ok::<_, io::Error>((response.trim_end_matches(['\r', '\n']).to_string(), elapsed))
    };

    timeout(target.timeout, exchange)
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no response from server"))?
}

async fn udp_round_trip(target: &Target, line: &str) -> io::Result<(String, Duration)> {
    let socket = UdpSocket::bind(("0.0.0.0", 0)).await?;
    socket
        .connect((target.host.as_str(), target.udp_port))
        .await?;

    let start = Instant::now();
    socket.send(line.as_bytes()).await?;

    let mut buf = vec![0u8; 65_536];
    let len = timeout(target.timeout, socket.recv(&mut buf))
        .await
        .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no response from server"))??;
    let elapsed = start.elapsed();

    Ok((String::from_utf8_lossy(&buf[..len]).into_owned(), elapsed))
}
