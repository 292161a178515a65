//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 真实 socket 上的 e2e 测试（本地 TCP/UDP collector）

#[cfg(test)]
mod contract_tests {
    use contracts::{DataPoint, EmitterConfig};

    #[test]
    fn test_line_format_snapshot() {
        let point = DataPoint::new("a.b", 5, 100).unwrap();
        assert_eq!(point.to_string(), "a.b 5 100");
    }

    #[test]
    fn test_default_config_roundtrips_through_loader() {
        let config = EmitterConfig::default();
        let toml = config_loader::ConfigLoader::to_toml(&config).unwrap();
        let parsed = config_loader::ConfigLoader::load_from_str(
            &toml,
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();
        assert_eq!(parsed, config);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::io::Read;
    use std::net::SocketAddr;
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{CodecKind, DispatcherConfig, TransportConfig, TransportKind};
    use dispatcher::Dispatcher;
    use flate2::read::GzDecoder;
    use metric::{Aggregate, MetricBuilder};
    use tokio::io::AsyncReadExt;
    use tokio::net::{TcpListener, UdpSocket};
    use tokio::task::JoinHandle;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    fn dispatcher_config(queue_size: usize) -> DispatcherConfig {
        DispatcherConfig {
            queue_size,
            retry_interval_ms: 20,
            ..DispatcherConfig::default()
        }
    }

    fn transport_config(addr: SocketAddr) -> TransportConfig {
        TransportConfig::new(addr.ip().to_string(), addr.port())
    }

    /// Accept one connection and return everything written to it
    fn collect_one(listener: TcpListener) -> JoinHandle<Vec<u8>> {
        tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut received = Vec::new();
            stream.read_to_end(&mut received).await.unwrap();
            received
        })
    }

    async fn shutdown(dispatcher: &Dispatcher) {
        assert!(dispatcher.wait_idle(WAIT).await, "points not delivered");
        dispatcher.close().await.unwrap();
    }

    /// End-to-end test: Dispatcher -> TCP collector
    ///
    /// 验证线协议字节完全一致，且按提交顺序到达。
    #[tokio::test]
    async fn test_e2e_tcp_plain_lines() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let collector = collect_one(listener);

        let dispatcher = Dispatcher::from_config(&dispatcher_config(100), &transport_config(addr));
        dispatcher.send("a.b", 5, Some(100));
        dispatcher.send("a.c", -2, Some(101));
        dispatcher.send("a.d", 7.0, Some(102));
        shutdown(&dispatcher).await;

        let received = timeout(WAIT, collector).await.unwrap().unwrap();
        assert_eq!(received, b"a.b 5 100\na.c -2 101\na.d 7 102\n");
    }

    #[tokio::test]
    async fn test_e2e_tcp_gzip_stream() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let collector = collect_one(listener);

        let transport = TransportConfig {
            codec: CodecKind::Gzip,
            ..transport_config(addr)
        };
        let dispatcher = Dispatcher::from_config(&dispatcher_config(100), &transport);
        dispatcher.send("a.b", 5, Some(100));
        shutdown(&dispatcher).await;

        let received = timeout(WAIT, collector).await.unwrap().unwrap();
        let mut decoded = String::new();
        GzDecoder::new(received.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, "a.b 5 100\n");
    }

    #[tokio::test]
    async fn test_e2e_udp_datagram() {
        let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = collector.local_addr().unwrap();

        let transport = TransportConfig {
            kind: TransportKind::Udp,
            ..transport_config(addr)
        };
        let dispatcher = Dispatcher::from_config(&dispatcher_config(100), &transport);
        dispatcher.send("a.b", 5, Some(100));
        dispatcher.send("a.c", 6, Some(100));

        let mut buf = [0u8; 1024];
        let mut received = Vec::new();
        while received.len() < 20 {
            let n = timeout(WAIT, collector.recv(&mut buf)).await.unwrap().unwrap();
            received.extend_from_slice(&buf[..n]);
        }
        assert_eq!(received, b"a.b 5 100\na.c 6 100\n");

        shutdown(&dispatcher).await;
    }

    /// 一次突发超过单个数据报上限：按行拆分后全部送达。
    #[tokio::test]
    async fn test_e2e_udp_burst_larger_than_datagram() {
        let collector = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = collector.local_addr().unwrap();

        let transport = TransportConfig {
            kind: TransportKind::Udp,
            ..transport_config(addr)
        };
        let dispatcher = Dispatcher::from_config(&dispatcher_config(1000), &transport);

        let name = "prod.checkout-service.web-host-0042.http.requests.latency.max";
        for i in 0..1000 {
            dispatcher.send(name, i, Some(1_700_000_000));
        }

        let mut buf = vec![0u8; 65_536];
        let mut lines = Vec::new();
        while lines.len() < 1000 {
            let n = timeout(WAIT, collector.recv(&mut buf)).await.unwrap().unwrap();
            let text = std::str::from_utf8(&buf[..n]).unwrap();
            lines.extend(text.lines().map(str::to_string));
        }
        assert_eq!(lines[0], format!("{name} 0 1700000000"));
        assert_eq!(lines[999], format!("{name} 999 1700000000"));

        // The dispatcher keeps flowing afterwards
        dispatcher.send("after.burst", 1, Some(1));
        let n = timeout(WAIT, collector.recv(&mut buf)).await.unwrap().unwrap();
        assert_eq!(&buf[..n], b"after.burst 1 1\n");

        shutdown(&dispatcher).await;
        let stats = dispatcher.stats();
        assert_eq!(stats.sent_points, 1001);
        assert_eq!(stats.transport_failures, 0);
    }

    /// 队列满时保留最早的点，丢弃后来者。
    #[tokio::test]
    async fn test_e2e_queue_overflow_keeps_first_points() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let collector = collect_one(listener);

        let dispatcher = Dispatcher::from_config(&dispatcher_config(10), &transport_config(addr));
        // No await between sends: the worker cannot drain in between.
        for i in 0..20 {
            dispatcher.send(format!("m.{i}"), i, Some(1));
        }
        shutdown(&dispatcher).await;

        let received = timeout(WAIT, collector).await.unwrap().unwrap();
        let expected: String = (0..10).map(|i| format!("m.{i} {i} 1\n")).collect();
        assert_eq!(String::from_utf8(received).unwrap(), expected);

        let stats = dispatcher.stats();
        assert_eq!(stats.accepted, 10);
        assert_eq!(stats.dropped, 10);
    }

    #[tokio::test]
    async fn test_e2e_close_without_sends_never_connects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let dispatcher = Dispatcher::from_config(&dispatcher_config(10), &transport_config(addr));
        dispatcher.close().await.unwrap();

        let accepted = timeout(Duration::from_millis(100), listener.accept()).await;
        assert!(accepted.is_err(), "collector should not see a connection");
    }

    /// Collector 先离线后上线：失败批次重新入队并在重试后送达。
    #[tokio::test]
    async fn test_e2e_retry_after_collector_comes_up() {
        let addr = {
            let probe = TcpListener::bind("127.0.0.1:0").await.unwrap();
            probe.local_addr().unwrap()
        };

        let dispatcher = Dispatcher::from_config(&dispatcher_config(100), &transport_config(addr));
        dispatcher.send("late.point", 1, Some(100));

        // Let at least one connect attempt fail.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(dispatcher.stats().transport_failures >= 1);

        let listener = TcpListener::bind(addr).await.unwrap();
        let collector = collect_one(listener);
        shutdown(&dispatcher).await;

        let received = timeout(WAIT, collector).await.unwrap().unwrap();
        assert_eq!(received, b"late.point 1 100\n");
    }

    /// 配置文件 -> Dispatcher -> Metric 门面
    #[tokio::test]
    async fn test_e2e_config_file_with_metric_facade() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let collector = collect_one(listener);

        let toml = format!(
            r#"
prefix = "svc"

[dispatcher]
queue_size = 50

[transport]
host = "{}"
port = {}
"#,
            addr.ip(),
            addr.port()
        );
        let config = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let dispatcher = Arc::new(Dispatcher::from_emitter_config(&config));

        let metric = MetricBuilder::new("jobs")
            .prefix(config.prefix.clone().unwrap_or_default())
            .aggregate(Aggregate::Sum)
            .build(Arc::clone(&dispatcher));
        metric.send(3, Some(100));
        shutdown(&dispatcher).await;

        let received = timeout(WAIT, collector).await.unwrap().unwrap();
        assert_eq!(received, b"svc.jobs.sum 3 100\n");
    }
}
