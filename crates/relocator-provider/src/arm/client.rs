use std::time::Duration;

use async_trait::async_trait;
use relocator_core::{
    ExecutionOutcome, MoveExecutor, MoveRequest, MoveValidator, ProviderError, TransientKind,
    ValidationOutcome,
};
use reqwest::{header::HeaderMap, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Deserialize;
use serde_json::json;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{ArmClientError, ArmConfig};

const VALIDATE_ACTION: &str = "validateMoveResources";
const MOVE_ACTION: &str = "moveResources";
/// `Retry-After` 상한.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// ARM 에러 응답 본문 (`{"error": {"code", "message"}}`).
#[derive(Debug, Deserialize)]
struct ArmErrorBody {
    error: ArmErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ArmErrorDetail {
    #[serde(default)]
    code: Option<String>,
    message: String,
}

/// 응답 해석 결과.
enum Reply {
    /// 작업 종료 (200/204)
    Done,
    /// 작업 진행 중 (202)
    Accepted {
        location: Option<String>,
        retry_after: Option<Duration>,
    },
}

/// ARM 리소스 이동 클라이언트.
pub struct ArmMoveClient {
    config: ArmConfig,
    client: reqwest::Client,
}

impl ArmMoveClient {
    pub fn new(config: ArmConfig) -> Result<Self, ArmClientError> {
        if !(config.endpoint.starts_with("https://") || config.endpoint.starts_with("http://")) {
            return Err(ArmClientError::InvalidEndpoint(config.endpoint.clone()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ArmConfig {
        &self.config
    }

    fn action_url(&self, request: &MoveRequest, action: &str) -> String {
        format!(
            "{}/subscriptions/{}/resourceGroups/{}/{}",
            self.config.endpoint, request.subscription_id, request.source_group, action
        )
    }

    /// 이동 작업 요청 후 LRO 종료까지 대기.
    async fn run_operation(&self, request: &MoveRequest, action: &str) -> Result<(), ProviderError> {
        let url = self.action_url(request, action);
        let body = json!({
            "resources": request.resource_ids,
            "targetResourceGroup": request.target_group_id,
        });

        debug!(
            action,
            source_group = %request.source_group,
            resources = request.resource_ids.len(),
            "ARM 이동 작업 요청"
        );

        let response = self
            .client
            .post(&url)
            .query(&[("api-version", self.config.api_version.as_str())])
            .bearer_auth(self.config.access_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(network_error)?;

        match interpret(response).await? {
            Reply::Done => Ok(()),
            Reply::Accepted {
                location,
                retry_after,
            } => self.poll(action, location, retry_after).await,
        }
    }

    /// `Location` 헤더를 따라 202가 아닌 응답이 올 때까지 폴링.
    ///
    /// 상태 조회의 일시적 오류(429/5xx, 네트워크)는 진행 중으로 보고 같은
    /// `Location`을 다시 조회합니다. 이동 요청은 다시 보내지 않습니다.
    async fn poll(
        &self,
        action: &str,
        location: Option<String>,
        mut retry_after: Option<Duration>,
    ) -> Result<(), ProviderError> {
        let mut location = location.ok_or_else(|| {
            ProviderError::Other(format!("{}: 202 응답에 Location 헤더가 없습니다", action))
        })?;
        let started = Instant::now();
        let mut polls = 0u32;

        loop {
            let delay = retry_after.unwrap_or(self.config.poll_interval);
            if started.elapsed().saturating_add(delay) > self.config.lro_timeout {
                warn!(action, polls, "LRO 대기 시간 초과");
                return Err(ProviderError::Other(format!(
                    "{}: 장기 실행 작업이 {}초 안에 끝나지 않았습니다",
                    action,
                    self.config.lro_timeout.as_secs()
                )));
            }

            tokio::time::sleep(delay).await;
            polls = polls.saturating_add(1);

            let reply = match self
                .client
                .get(&location)
                .bearer_auth(self.config.access_token.expose_secret())
                .send()
                .await
            {
                Ok(response) => interpret(response).await,
                Err(e) => Err(network_error(e)),
            };

            match reply {
                Ok(Reply::Done) => {
                    debug!(action, polls, "LRO 완료");
                    return Ok(());
                }
                Ok(Reply::Accepted {
                    location: next_location,
                    retry_after: next_retry_after,
                }) => {
                    if let Some(next) = next_location {
                        location = next;
                    }
                    retry_after = next_retry_after;
                }
                Err(e) if e.is_retryable() => {
                    warn!(action, polls, error = %e, "LRO 상태 조회 일시적 오류, 계속 대기");
                    retry_after = e.retry_delay_ms().map(Duration::from_millis);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[async_trait]
impl MoveValidator for ArmMoveClient {
    async fn validate(&self, request: &MoveRequest) -> Result<ValidationOutcome, ProviderError> {
        match self.run_operation(request, VALIDATE_ACTION).await {
            Ok(()) => Ok(ValidationOutcome::valid()),
            Err(ProviderError::Rejected(message)) => {
                info!(source_group = %request.source_group, error = %message, "이동 검증 거부");
                Ok(ValidationOutcome::invalid(message))
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl MoveExecutor for ArmMoveClient {
    async fn execute(&self, request: &MoveRequest) -> Result<ExecutionOutcome, ProviderError> {
        match self.run_operation(request, MOVE_ACTION).await {
            Ok(()) => Ok(ExecutionOutcome::succeeded()),
            Err(ProviderError::Rejected(message)) => {
                info!(source_group = %request.source_group, error = %message, "이동 실행 거부");
                Ok(ExecutionOutcome::failed(message))
            }
            Err(e) => Err(e),
        }
    }
}

async fn interpret(response: Response) -> Result<Reply, ProviderError> {
    let status = response.status();
    let retry_after = retry_after(response.headers());

    if status == StatusCode::ACCEPTED {
        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        return Ok(Reply::Accepted {
            location,
            retry_after,
        });
    }

    if status.is_success() {
        return Ok(Reply::Done);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    let code = status.as_u16();

    Err(match code {
        401 | 403 => ProviderError::Authentication(message),
        _ => match TransientKind::from_status(code) {
            Some(kind) => ProviderError::Transient {
                kind,
                message,
                retry_after_ms: retry_after.map(|d| d.as_millis() as u64),
            },
            None => ProviderError::Rejected(message),
        },
    })
}

/// ARM `error.message`, 없으면 원문 본문.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ArmErrorBody>(body) {
        if let Some(code) = parsed.error.code.as_deref() {
            debug!(status = status.as_u16(), code, "ARM 에러 응답");
        }
        return parsed.error.message;
    }

    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.to_string()
    }
}

/// `Retry-After` (초 단위, [`MAX_RETRY_AFTER`]로 제한).
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(|secs| Duration::from_secs(secs).min(MAX_RETRY_AFTER))
}

fn network_error(e: reqwest::Error) -> ProviderError {
    ProviderError::transient(TransientKind::Network, e.to_string())
}
