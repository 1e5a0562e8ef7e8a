use duokv::config::Config;
use duokv::server::{self, Listeners};
use duokv::store::new_shared_store;
use rand::Rng;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpStream, UdpSocket};
use tokio_util::sync::CancellationToken;

async fn start_server() -> (SocketAddr, SocketAddr, CancellationToken) {
    let config = Config {
        tcp_port: 0,
        udp_port: 0,
        ..Default::default()
    };
    let listeners = Listeners::bind(&config).await.unwrap();
    let tcp_addr = listeners.tcp_addr().unwrap();
    let udp_addr = listeners.udp_addr().unwrap();
    let shutdown = CancellationToken::new();

    let token = shutdown.clone();
    tokio::spawn(async move {
        let _ = server::serve(listeners, new_shared_store(), &config, token).await;
    });

    (tcp_addr, udp_addr, shutdown)
}

async fn bench_tcp_put_get(addr: SocketAddr, iterations: usize) -> (f64, f64) {
    let stream = TcpStream::connect(addr).await.unwrap();
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    let start = Instant::now();
    for i in 0..iterations {
        writer
            .write_all(format!("put tcp_key_{i} value_{i}\n").as_bytes())
            .await
            .unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
    }
    let put_ops = iterations as f64 / start.elapsed().as_secs_f64();

    let mut rng = rand::thread_rng();
    let start = Instant::now();
    for _ in 0..iterations {
        let i = rng.gen_range(0..iterations);
        writer
            .write_all(format!("get tcp_key_{i}\n").as_bytes())
            .await
            .unwrap();
        line.clear();
        reader.read_line(&mut line).await.unwrap();
    }
    let get_ops = iterations as f64 / start.elapsed().as_secs_f64();

    (put_ops, get_ops)
}

async fn bench_udp_put_get(addr: SocketAddr, iterations: usize) -> (f64, f64) {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(addr).await.unwrap();
    let mut buf = vec![0u8; 65_536];

    let start = Instant::now();
    for i in 0..iterations {
        socket
            .send(format!("put udp_key_{i} value_{i}").as_bytes())
            .await
            .unwrap();
        socket.recv(&mut buf).await.unwrap();
    }
    let put_ops = iterations as f64 / start.elapsed().as_secs_f64();

    let mut rng = rand::thread_rng();
    let start = Instant::now();
    for _ in 0..iterations {
        let i = rng.gen_range(0..iterations);
        socket
            .send(format!("get udp_key_{i}").as_bytes())
            .await
            .unwrap();
        socket.recv(&mut buf).await.unwrap();
    }
    let get_ops = iterations as f64 / start.elapsed().as_secs_f64();

    (put_ops, get_ops)
}

async fn bench_parallel_sessions(addr: SocketAddr, sessions: usize, iterations: usize) -> f64 {
    let start = Instant::now();
    let tasks: Vec<_> = (0..sessions)
        .map(|s| {
            tokio::spawn(async move {
                let stream = TcpStream::connect(addr).await.unwrap();
                let (reader, mut writer) = stream.into_split();
                let mut reader = BufReader::new(reader);
                let mut line = String::new();
                for i in 0..iterations {
                    writer
                        .write_all(format!("put par_{s}_{i} v\n").as_bytes())
                        .await
                        .unwrap();
                    line.clear();
                    reader.read_line(&mut line).await.unwrap();
                }
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }
    (sessions * iterations) as f64 / start.elapsed().as_secs_f64()
}

#[tokio::main]
async fn main() {
    let (tcp_addr, udp_addr, shutdown) = start_server().await;
    let iterations = 10_000;

    println!("=== duokv Benchmark ({iterations} operations) ===\n");

    let (put_ops, get_ops) = bench_tcp_put_get(tcp_addr, iterations).await;
    println!("TCP PUT:  {put_ops:>10.0} ops/sec");
    println!("TCP GET:  {get_ops:>10.0} ops/sec");

    let (put_ops, get_ops) = bench_udp_put_get(udp_addr, iterations).await;
    println!("UDP PUT:  {put_ops:>10.0} ops/sec");
    println!("UDP GET:  {get_ops:>10.0} ops/sec");

    let par_ops = bench_parallel_sessions(tcp_addr, 16, iterations / 10).await;
    println!("TCP PAR:  {par_ops:>10.0} ops/sec (16 sessions)");

    shutdown.cancel();
    println!("\n=== Done ===");
}
