//! 配置校验模块
//!
//! 校验规则：
//! - queue_size > 0
//! - max_batch_size > 0 (如设置)
//! - retry_interval_ms > 0, shutdown_timeout_ms > 0
//! - host 非空, port > 0
//! - 0 < max_payload_len <= 65507 (单个 UDP 数据报)
//! - prefix 不含空白字符

use contracts::{is_valid_name, ContractError, EmitterConfig, MAX_DATAGRAM_PAYLOAD_LEN};

/// 校验 EmitterConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &EmitterConfig) -> Result<(), ContractError> {
    validate_dispatcher(config)?;
    validate_transport(config)?;
    validate_prefix(config)?;
    Ok(())
}

/// 校验队列与批量配置
fn validate_dispatcher(config: &EmitterConfig) -> Result<(), ContractError> {
    let dispatcher = &config.dispatcher;

    if dispatcher.queue_size == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.queue_size",
            "queue_size must be > 0",
        ));
    }

    if dispatcher.max_batch_size == Some(0) {
        return Err(ContractError::config_validation(
            "dispatcher.max_batch_size",
            "max_batch_size must be > 0 when set",
        ));
    }

    // 0 would make the worker retry a down collector without pausing
    if dispatcher.retry_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.retry_interval_ms",
            "retry_interval_ms must be > 0",
        ));
    }

    if dispatcher.shutdown_timeout_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.shutdown_timeout_ms",
            "shutdown_timeout_ms must be > 0",
        ));
    }

    Ok(())
}

/// 校验采集端地址
fn validate_transport(config: &EmitterConfig) -> Result<(), ContractError> {
    let transport = &config.transport;

    if transport.host.trim().is_empty() {
        return Err(ContractError::config_validation(
            "transport.host",
            "host cannot be empty",
        ));
    }

    if transport.port == 0 {
        return Err(ContractError::config_validation(
            "transport.port",
            "port must be > 0",
        ));
    }

    if transport.max_payload_len == 0 || transport.max_payload_len > MAX_DATAGRAM_PAYLOAD_LEN {
        return Err(ContractError::config_validation(
            "transport.max_payload_len",
            format!("max_payload_len must be in 1..={MAX_DATAGRAM_PAYLOAD_LEN}"),
        ));
    }

    Ok(())
}

/// 校验指标名前缀
fn validate_prefix(config: &EmitterConfig) -> Result<(), ContractError> {
    match config.prefix.as_deref() {
        Some(prefix) if !prefix.is_empty() && !is_valid_name(prefix) => {
            Err(ContractError::config_validation(
                "prefix",
                format!("prefix '{prefix}' must not contain whitespace"),
            ))
        }
        _ => Ok(()),
    }
}
