use anyhow::{anyhow, Result};
use candle::Device;
use tracing::warn;

/// Parses a device preference such as `cpu`, `cuda`, `cuda:1`, `gpu:0` or
/// `metal`. Unknown values fall back to the CPU.
pub fn build_device(preference: &str) -> Result<Device> {
    let trimmed = preference.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower.is_empty() || lower == "cpu" {
        Ok(Device::Cpu)
    } else if lower.starts_with("cuda") || lower.starts_with("gpu") {
        let ordinal = device_ordinal(trimmed);
        Device::new_cuda(ordinal).map_err(|err| {
            anyhow!(
                "requested CUDA device {ordinal} but initialization failed ({err}). Build with \
                 the `cuda` feature and ensure CUDA libraries are available."
            )
        })
    } else if lower.starts_with("metal") || lower == "mps" {
        let ordinal = device_ordinal(trimmed);
        Device::new_metal(ordinal)
            .map_err(|err| anyhow!("requested Metal device {ordinal} but initialization failed: {err}"))
    } else {
        warn!(device = trimmed, "unrecognized device preference, using cpu");
        Ok(Device::Cpu)
    }
}

fn device_ordinal(value: &str) -> usize {
    value
        .split(':')
        .nth(1)
        .and_then(|part| part.trim().parse::<usize>().ok())
        .unwrap_or(0)
}
