//! Gearman プロトコルのクライアント側（フォアグラウンドジョブのみ）
//!
//! # パケット
//! ```text
//! magic(4) "\0REQ" | "\0RES"
//! type(4)  big-endian u32
//! size(4)  big-endian u32
//! data     引数を NUL で区切ったもの
//! ```

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};
use uuid::Uuid;

use super::transport::{JobResponse, JobState, QueueConnection, QueueConnector};
use crate::client::error::{ClientError, ClientResult};

const REQ_MAGIC: &[u8; 4] = b"\0REQ";
const RES_MAGIC: &[u8; 4] = b"\0RES";
const HEADER_LEN: usize = 12;
/// これを超えるパケットは壊れているとみなす
const MAX_PACKET_SIZE: u32 = 64 * 1024 * 1024;

/// Packet types used by a foreground client.
pub mod packet {
    pub const SUBMIT_JOB: u32 = 7;
    pub const JOB_CREATED: u32 = 8;
    pub const WORK_STATUS: u32 = 12;
    pub const WORK_COMPLETE: u32 = 13;
    pub const WORK_FAIL: u32 = 14;
    pub const ERROR: u32 = 19;
    pub const WORK_EXCEPTION: u32 = 25;
    pub const WORK_DATA: u32 = 28;
    pub const WORK_WARNING: u32 = 29;
}

/// リクエストパケットを組み立てる
pub fn encode_request(kind: u32, args: &[&[u8]]) -> Vec<u8> {
    let body = args.join(&0u8);
    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(REQ_MAGIC);
    out.extend_from_slice(&kind.to_be_bytes());
    out.extend_from_slice(&(body.len() as u32).to_be_bytes());
    out.extend_from_slice(&body);
    out
}

/// レスポンスパケットを 1 つ読む
pub async fn read_response<R: AsyncRead + Unpin>(reader: &mut R) -> ClientResult<(u32, Vec<u8>)> {
    let mut header = [0u8; HEADER_LEN];
    reader
        .read_exact(&mut header)
        .await
        .map_err(|e| ClientError::Transport(format!("gearman connection lost: {e}")))?;

    if &header[0..4] != RES_MAGIC {
        return Err(ClientError::InvalidResponse(format!(
            "bad gearman magic {:?}",
            &header[0..4]
        )));
    }
    let kind = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    let size = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);
    if size > MAX_PACKET_SIZE {
        return Err(ClientError::InvalidResponse(format!(
            "gearman packet too large ({size} bytes)"
        )));
    }

    let mut body = vec![0u8; size as usize];
    reader
        .read_exact(&mut body)
        .await
        .map_err(|e| ClientError::Transport(format!("gearman connection lost: {e}")))?;
    Ok((kind, body))
}

/// `handle\0payload` の payload 部分
fn after_handle(body: &[u8]) -> &[u8] {
    match body.iter().position(|b| *b == 0) {
        Some(i) => &body[i + 1..],
        None => &[],
    }
}

/// TCP で gearmand に接続する
#[derive(Debug, Clone, Copy, Default)]
pub struct GearmanConnector;

#[async_trait]
impl QueueConnector for GearmanConnector {
    async fn connect(&self, server: &str) -> ClientResult<Box<dyn QueueConnection>> {
        let stream = TcpStream::connect(server)
            .await
            .map_err(|e| ClientError::Transport(format!("cannot connect to {server}: {e}")))?;
        Ok(Box::new(GearmanConnection::new(stream)))
    }
}

pub struct GearmanConnection<S> {
    stream: S,
}

impl<S> GearmanConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub fn new(stream: S) -> Self {
        Self { stream }
    }

    /// JOB_CREATED を見たかどうかを `state` に反映しながら完了まで読む
    ///
    /// 結果は WORK_COMPLETE の本体だけ。WORK_DATA は途中経過なので結果に混ぜない。
    async fn wait_for_result(&mut self, state: &mut JobState) -> ClientResult<JobResponse> {
        loop {
            let (kind, body) = read_response(&mut self.stream).await?;
            match kind {
                packet::JOB_CREATED => *state = JobState::Created,
                packet::WORK_DATA => {
                    debug!(bytes = after_handle(&body).len(), "gearman data update");
                }
                packet::WORK_STATUS | packet::WORK_WARNING => {}
                packet::WORK_COMPLETE => {
                    return Ok(JobResponse::new(JobState::Complete, after_handle(&body)));
                }
                packet::WORK_FAIL => return Ok(JobResponse::new(JobState::Failed, Vec::new())),
                packet::WORK_EXCEPTION => {
                    let text = String::from_utf8_lossy(after_handle(&body)).into_owned();
                    warn!(exception = %text, "gearman worker raised");
                    return Ok(JobResponse::new(JobState::Failed, text));
                }
                packet::ERROR => {
                    let text = String::from_utf8_lossy(&body).replace('\0', ": ");
                    return Err(ClientError::Transport(format!("gearman error: {text}")));
                }
                other => debug!(packet_type = other, "ignoring gearman packet"),
            }
        }
    }
}

#[async_trait]
impl<S> QueueConnection for GearmanConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    async fn submit_job(
        &mut self,
        ability: &str,
        data: &[u8],
        poll_timeout: Duration,
    ) -> ClientResult<JobResponse> {
        let unique = Uuid::new_v4().simple().to_string();
        let request = encode_request(
            packet::SUBMIT_JOB,
            &[ability.as_bytes(), unique.as_bytes(), data],
        );
        self.stream
            .write_all(&request)
            .await
            .map_err(|e| ClientError::Transport(format!("gearman write failed: {e}")))?;

        let mut state = JobState::Pending;
        let outcome = tokio::time::timeout(poll_timeout, self.wait_for_result(&mut state)).await;
        match outcome {
            Ok(result) => result,
            // 期限切れ時点の状態をそのまま返す
            Err(_) => Ok(JobResponse::new(state, Vec::new())),
        }
    }

    async fn shutdown(&mut self) {
        if let Err(e) = self.stream.shutdown().await {
            debug!(error = %e, "gearman shutdown failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{DuplexStream, duplex};

    fn response(kind: u32, args: &[&[u8]]) -> Vec<u8> {
        let mut out = encode_request(kind, args);
        out[..4].copy_from_slice(RES_MAGIC);
        out
    }

    /// SUBMIT_JOB を 1 つ読んで、決められたパケットを返す。
    /// stream も返すので、JoinHandle が生きている間は接続が切れない。
    async fn serve(
        mut server: DuplexStream,
        replies: Vec<Vec<u8>>,
    ) -> (u32, Vec<u8>, DuplexStream) {
        let mut header = [0u8; HEADER_LEN];
        server.read_exact(&mut header).await.unwrap();
        assert_eq!(&header[..4], REQ_MAGIC);
        let kind = u32::from_be_bytes(header[4..8].try_into().unwrap());
        let size = u32::from_be_bytes(header[8..12].try_into().unwrap());
        let mut body = vec![0u8; size as usize];
        server.read_exact(&mut body).await.unwrap();

        for reply in replies {
            server.write_all(&reply).await.unwrap();
        }
        (kind, body, server)
    }

    #[test]
    fn request_framing() {
        let pkt = encode_request(packet::SUBMIT_JOB, &[b"fn", b"u", b"{}"]);
        assert_eq!(&pkt[..4], b"\0REQ");
        assert_eq!(&pkt[4..8], &7u32.to_be_bytes());
        assert_eq!(&pkt[8..12], &7u32.to_be_bytes());
        assert_eq!(&pkt[12..], b"fn\0u\0{}");
    }

    #[tokio::test]
    async fn result_is_the_work_complete_body_only() {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(serve(
            server,
            vec![
                response(packet::JOB_CREATED, &[b"H:1"]),
                response(packet::WORK_STATUS, &[b"H:1", b"1", b"2"]),
                response(packet::WORK_DATA, &[b"H:1", b"progress 50%"]),
                response(packet::WORK_COMPLETE, &[b"H:1", b"{\"id\":1}"]),
            ],
        ));

        let mut conn = GearmanConnection::new(client);
        let resp = conn
            .submit_job("approveJob", b"{}", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(resp.state, JobState::Complete);
        assert_eq!(resp.result, b"{\"id\":1}");
        server.abort();
    }

    #[tokio::test]
    async fn submit_sends_ability_and_payload() {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(serve(
            server,
            vec![response(packet::WORK_COMPLETE, &[b"H:1", b"ok"])],
        ));

        let mut conn = GearmanConnection::new(client);
        conn.submit_job("getJobsAwaitingApproval", b"{\"user_id\":1}", Duration::from_secs(1))
            .await
            .unwrap();
        drop(conn);

        let (kind, body, _stream) = server.await.unwrap();
        assert_eq!(kind, packet::SUBMIT_JOB);
        let parts: Vec<&[u8]> = body.splitn(3, |b| *b == 0).collect();
        assert_eq!(parts[0], b"getJobsAwaitingApproval");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2], b"{\"user_id\":1}");
    }

    #[tokio::test]
    async fn created_but_unfinished_job_times_out_as_created() {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(serve(
            server,
            vec![response(packet::JOB_CREATED, &[b"H:1"])],
        ));

        let mut conn = GearmanConnection::new(client);
        let resp = conn
            .submit_job("approveJob", b"{}", Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(resp.state, JobState::Created);
        server.abort();
    }

    #[tokio::test]
    async fn work_fail_is_failed_state() {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(serve(
            server,
            vec![
                response(packet::JOB_CREATED, &[b"H:1"]),
                response(packet::WORK_FAIL, &[b"H:1"]),
            ],
        ));

        let mut conn = GearmanConnection::new(client);
        let resp = conn
            .submit_job("approveJob", b"{}", Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(resp.state, JobState::Failed);
        server.abort();
    }

    #[tokio::test]
    async fn error_packet_is_a_transport_error() {
        let (client, server) = duplex(4096);
        let server = tokio::spawn(serve(
            server,
            vec![response(packet::ERROR, &[b"ERR_UNKNOWN", b"no such ability"])],
        ));

        let mut conn = GearmanConnection::new(client);
        let err = conn
            .submit_job("nope", b"{}", Duration::from_secs(1))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Transport(ref m) if m.contains("no such ability")));
        server.abort();
    }

    #[tokio::test]
    async fn bad_magic_is_rejected() {
        let mut bytes: &[u8] = b"\0XXX\0\0\0\x0d\0\0\0\0";
        let err = read_response(&mut bytes).await.unwrap_err();
        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }
}
