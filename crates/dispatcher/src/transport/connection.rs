//! Connection - lazily connected TCP stream or UDP socket to the collector

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};

use contracts::{
    Codec, DataPoint, SendError, Transport, TransportConfig, TransportError, TransportKind,
};
use tokio::io::AsyncWriteExt;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tracing::{debug, instrument, trace, warn};

use super::codec::LineCodec;

/// Open socket to the collector
#[derive(Debug)]
enum Link {
    Stream(TcpStream),
    Datagram(UdpSocket),
}

impl Link {
    async fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        match self {
            Self::Stream(stream) => {
                stream.write_all(payload).await?;
                stream.flush().await
            }
            Self::Datagram(socket) => socket.send(payload).await.map(|_| ()),
        }
    }
}

#[derive(Debug)]
enum State {
    Unconnected,
    Connected(Link),
    Closed,
}

/// Transport connection to a single `(host, port)` endpoint
///
/// The socket is opened on the first send, not at construction. A failed
/// connect or write leaves the connection unconnected, so the next send
/// connects again. After `close` every send fails with
/// [`TransportError::Closed`].
#[derive(Debug)]
pub struct Connection<C = LineCodec> {
    host: String,
    port: u16,
    endpoint: String,
    kind: TransportKind,
    max_payload_len: usize,
    codec: C,
    state: State,
}

impl Connection<LineCodec> {
    /// Create a connection using the configured kind and codec
    pub fn from_config(config: &TransportConfig) -> Self {
        Self::with_codec(config, LineCodec::from(config.codec))
    }
}

impl<C: Codec> Connection<C> {
    /// Create a connection with a custom codec; `config.codec` is ignored
    pub fn with_codec(config: &TransportConfig, codec: C) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            endpoint: config.endpoint(),
            kind: config.kind,
            max_payload_len: config.max_payload_len,
            codec,
            state: State::Unconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, State::Connected(_))
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Open the underlying socket if not already open
    ///
    /// TCP performs the full handshake; UDP only binds an ephemeral local
    /// port associated with the remote address.
    #[instrument(
        name = "connection_connect",
        skip(self),
        fields(endpoint = %self.endpoint, kind = ?self.kind)
    )]
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        match self.state {
            State::Closed => return Err(TransportError::closed(&self.endpoint)),
            State::Connected(_) => return Ok(()),
            State::Unconnected => {}
        }

        let link = self
            .open_link()
            .await
            .map_err(|e| TransportError::connect(&self.endpoint, e))?;
        self.state = State::Connected(link);

        debug!(endpoint = %self.endpoint, kind = ?self.kind, "Connection established");
        Ok(())
    }

    async fn open_link(&self) -> io::Result<Link> {
        match self.kind {
            TransportKind::Tcp => {
                let stream = TcpStream::connect((self.host.as_str(), self.port)).await?;
                Ok(Link::Stream(stream))
            }
            TransportKind::Udp => {
                let remote = self.resolve().await?;
                let local = if remote.is_ipv6() {
                    SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
                } else {
                    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
                };
                let socket = UdpSocket::bind(local).await?;
                socket.connect(remote).await?;
                Ok(Link::Datagram(socket))
            }
        }
    }

    async fn resolve(&self) -> io::Result<SocketAddr> {
        lookup_host((self.host.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address for {}", self.endpoint),
                )
            })
    }

    fn encode(&self, batch: &[DataPoint]) -> Result<Vec<u8>, TransportError> {
        self.codec
            .encode(batch)
            .map_err(|e| TransportError::encode(&self.endpoint, e))
    }

    /// Send a batch as one or more datagrams of at most `max_payload_len` bytes
    ///
    /// Lines are never split. A chunk whose encoding still overflows is halved;
    /// a single point that cannot fit is dropped.
    async fn send_datagrams(&mut self, batch: &[DataPoint]) -> Result<usize, TransportError> {
        let mut pending = split_by_line_len(batch, self.max_payload_len);
        pending.reverse();
        let mut written = 0;

        while let Some(chunk) = pending.pop() {
            let payload = self.encode(chunk)?;
            if payload.len() <= self.max_payload_len {
                self.write(&payload).await?;
                written += payload.len();
            } else if chunk.len() > 1 {
                let (head, tail) = chunk.split_at(chunk.len() / 2);
                pending.push(tail);
                pending.push(head);
            } else {
                warn!(
                    endpoint = %self.endpoint,
                    name = chunk[0].name(),
                    bytes = payload.len(),
                    limit = self.max_payload_len,
                    "Data point exceeds datagram payload limit, dropped"
                );
            }
        }

        Ok(written)
    }

    async fn write(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let result = match &mut self.state {
            State::Connected(link) => link.write(payload).await,
            State::Unconnected => Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is not established",
            )),
            State::Closed => return Err(TransportError::closed(&self.endpoint)),
        };

        result.map_err(|e| {
            self.state = State::Unconnected;
            TransportError::write(&self.endpoint, e)
        })
    }
}

impl<C: Codec> Transport for Connection<C> {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&mut self, batch: &[DataPoint]) -> Result<(), SendError> {
        if !self.is_connected() {
            self.connect().await?;
        }

        let bytes = match self.kind {
            TransportKind::Tcp => {
                let payload = self.encode(batch)?;
                self.write(&payload).await?;
                payload.len()
            }
            TransportKind::Udp => self.send_datagrams(batch).await?,
        };

        trace!(endpoint = %self.endpoint, points = batch.len(), bytes, "Batch written");
        Ok(())
    }

    async fn close(&mut self) {
        match std::mem::replace(&mut self.state, State::Closed) {
            State::Connected(Link::Stream(mut stream)) => {
                if let Err(e) = stream.shutdown().await {
                    debug!(endpoint = %self.endpoint, error = %e, "Stream shutdown failed");
                }
            }
            State::Connected(Link::Datagram(_)) | State::Unconnected | State::Closed => {}
        }
        debug!(endpoint = %self.endpoint, "Connection closed");
    }
}

/// Greedily group consecutive points whose plain lines fit in `limit` bytes
///
/// A line longer than `limit` gets a chunk of its own.
fn split_by_line_len(batch: &[DataPoint], limit: usize) -> Vec<&[DataPoint]> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut len = 0;

    for (i, point) in batch.iter().enumerate() {
        let line_len = point.to_string().len() + 1;
        if i > start && len + line_len > limit {
            chunks.push(&batch[start..i]);
            start = i;
            len = 0;
        }
        len += line_len;
    }
    if start < batch.len() {
        chunks.push(&batch[start..]);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{CodecKind, DEFAULT_MAX_PAYLOAD_LEN};
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;
    use tokio::time::{timeout, Duration};

    fn point(name: &str, value: i64, timestamp: i64) -> DataPoint {
        DataPoint::new(name, value, timestamp).unwrap()
    }

    fn config(port: u16, kind: TransportKind, codec: CodecKind) -> TransportConfig {
        TransportConfig {
            kind,
            codec,
            ..TransportConfig::new("127.0.0.1", port)
        }
    }

    async fn read_all(listener: &TcpListener) -> Vec<u8> {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = Vec::new();
        socket.read_to_end(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn test_tcp_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut conn = Connection::from_config(&config(port, TransportKind::Tcp, CodecKind::Plain));
        assert!(!conn.is_connected());

        conn.send(&[point("test_send_tcp", 1, 1)]).await.unwrap();
        assert!(conn.is_connected());
        conn.close().await;

        let received = timeout(Duration::from_secs(1), read_all(&listener))
            .await
            .unwrap();
        assert_eq!(received, b"test_send_tcp 1 1\n");
    }

    #[tokio::test]
    async fn test_tcp_gzip_send() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut conn = Connection::from_config(&config(port, TransportKind::Tcp, CodecKind::Gzip));
        conn.send(&[point("two", 2, 2), point("two", 3, 3)])
            .await
            .unwrap();
        conn.close().await;

        let received = timeout(Duration::from_secs(1), read_all(&listener))
            .await
            .unwrap();
        let mut decoded = Vec::new();
        GzDecoder::new(received.as_slice())
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, b"two 2 2\ntwo 3 3\n");
    }

    #[tokio::test]
    async fn test_udp_send() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();

        let mut conn = Connection::from_config(&config(port, TransportKind::Udp, CodecKind::Plain));
        conn.send(&[point("test_send_udp", 1, 1)]).await.unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = timeout(Duration::from_secs(1), server.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"test_send_udp 1 1\n");
        conn.close().await;
    }

    /// Receive datagrams until `lines` newline-terminated lines have arrived
    async fn recv_lines(server: &UdpSocket, lines: usize, limit: usize) -> Vec<String> {
        let mut buf = vec![0u8; 65_536];
        let mut received = Vec::new();
        while received.len() < lines {
            let (len, _) = timeout(Duration::from_secs(1), server.recv_from(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert!(len <= limit, "datagram of {len} bytes exceeds {limit}");
            assert_eq!(buf[len - 1], b'\n', "datagram must end on a line boundary");
            let text = std::str::from_utf8(&buf[..len]).unwrap();
            received.extend(text.lines().map(str::to_string));
        }
        received
    }

    #[tokio::test]
    async fn test_udp_burst_split_into_datagrams() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let name = "prod.checkout-service.web-host-0042.http.requests.latency.max";
        let batch: Vec<DataPoint> = (0..1000).map(|i| point(name, i, 1_700_000_000)).collect();

        let mut conn = Connection::from_config(&config(port, TransportKind::Udp, CodecKind::Plain));
        conn.send(&batch).await.unwrap();

        let received = recv_lines(&server, batch.len(), DEFAULT_MAX_PAYLOAD_LEN).await;
        let expected: Vec<String> = batch.iter().map(ToString::to_string).collect();
        assert_eq!(received, expected);
        conn.close().await;
    }

    #[tokio::test]
    async fn test_udp_gzip_chunks_fit_limit() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let batch: Vec<DataPoint> = (0..200)
            .map(|i| point(&format!("host-{i}.cpu.load"), i * 7919, 1))
            .collect();

        let transport = TransportConfig {
            max_payload_len: 512,
            ..config(port, TransportKind::Udp, CodecKind::Gzip)
        };
        let mut conn = Connection::from_config(&transport);
        conn.send(&batch).await.unwrap();

        let mut buf = vec![0u8; 65_536];
        let mut lines = 0;
        while lines < batch.len() {
            let (len, _) = timeout(Duration::from_secs(1), server.recv_from(&mut buf))
                .await
                .unwrap()
                .unwrap();
            assert!(len <= 512);
            let mut decoded = String::new();
            GzDecoder::new(&buf[..len]).read_to_string(&mut decoded).unwrap();
            lines += decoded.lines().count();
        }
        assert_eq!(lines, batch.len());
    }

    #[tokio::test]
    async fn test_udp_oversized_point_dropped() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = server.local_addr().unwrap().port();
        let transport = TransportConfig {
            max_payload_len: 32,
            ..config(port, TransportKind::Udp, CodecKind::Plain)
        };
        let mut conn = Connection::from_config(&transport);

        let long_name = "a".repeat(40);
        conn.send(&[point(&long_name, 1, 1), point("small", 2, 2)])
            .await
            .unwrap();

        let received = recv_lines(&server, 1, 32).await;
        assert_eq!(received, vec!["small 2 2"]);
    }

    #[test]
    fn test_split_by_line_len() {
        // "a 1 1\n" is 6 bytes
        let batch: Vec<DataPoint> = (0..5).map(|_| point("a", 1, 1)).collect();
        let sizes: Vec<usize> = split_by_line_len(&batch, 13).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![2, 2, 1]);

        let sizes: Vec<usize> = split_by_line_len(&batch, 3).iter().map(|c| c.len()).collect();
        assert_eq!(sizes, vec![1, 1, 1, 1, 1]);

        assert!(split_by_line_len(&[], 10).is_empty());
    }

    #[tokio::test]
    async fn test_connect_refused_stays_unconnected() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut conn = Connection::from_config(&config(port, TransportKind::Tcp, CodecKind::Plain));
        let err = conn.send(&[point("x", 1, 1)]).await.unwrap_err();

        assert!(err.is_retryable());
        assert!(matches!(err, SendError::Transport(TransportError::Connect { .. })));
        assert!(!conn.is_connected());
        assert!(!conn.is_closed());
    }

    #[tokio::test]
    async fn test_send_after_close_fails() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut conn = Connection::from_config(&config(port, TransportKind::Tcp, CodecKind::Plain));
        conn.send(&[point("test_send", 1, 1)]).await.unwrap();
        conn.close().await;
        conn.close().await;

        let err = conn.send(&[point("test_send", 1, 1)]).await.unwrap_err();
        assert!(matches!(err, SendError::Transport(TransportError::Closed { .. })));
    }

    #[tokio::test]
    async fn test_close_when_unconnected_is_noop() {
        let mut conn = Connection::from_config(&TransportConfig::default());
        conn.close().await;
        assert!(conn.is_closed());
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_encode_failure_is_transport_error() {
        struct FailingCodec;

        impl Codec for FailingCodec {
            fn encode(&self, _batch: &[DataPoint]) -> io::Result<Vec<u8>> {
                Err(io::Error::new(io::ErrorKind::InvalidData, "cannot encode"))
            }
        }

        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = udp.local_addr().unwrap().port();
        let mut conn = Connection::with_codec(
            &config(port, TransportKind::Udp, CodecKind::Plain),
            FailingCodec,
        );

        let err = conn.send(&[point("x", 1, 1)]).await.unwrap_err();
        assert!(matches!(err, SendError::Transport(TransportError::Encode { .. })));
    }
}
