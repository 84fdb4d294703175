use log::{debug, info, warn};
use reqwest::Client;

use crate::config::{Config, Credentials, SpeedtestConfig};
use crate::provider::cloudflare::CloudflareClient;
use crate::provider::pushplus::PushPlusNotifier;
use crate::speedtest;

/// How a run ended. Every variant except `Updated` is an early exit that
/// touched no records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Updated {
        attempted: usize,
        succeeded: usize,
        content: String,
    },
    NoIpFetched,
    NoValidIp,
    NoDnsRecords,
}

pub struct Pipeline {
    client: Client,
    hostname: String,
    speedtest: SpeedtestConfig,
    cloudflare: CloudflareClient,
    notifier: PushPlusNotifier,
}

impl Pipeline {
    pub fn new(client: Client, config: &Config, credentials: &Credentials) -> Self {
        Self {
            hostname: credentials.dns_name.clone(),
            speedtest: config.speedtest.clone(),
            cloudflare: CloudflareClient::new(client.clone(), &config.cloudflare, credentials),
            notifier: PushPlusNotifier::new(client.clone(), &config.pushplus, credentials),
            client,
        }
    }

    pub async fn run(&self) -> RunOutcome {
        let Some(raw) = speedtest::fetch_candidate_ips(&self.client, &self.speedtest).await else {
            self.abort("获取IP地址失败，可能测速网站无法访问").await;
            return RunOutcome::NoIpFetched;
        };

        let ips = speedtest::parse_candidate_ips(&raw);
        if ips.is_empty() {
            self.abort("解析后没有有效的IP地址").await;
            return RunOutcome::NoValidIp;
        }
        info!("Got {} candidate IP(s): {:?}", ips.len(), ips);

        let records = self.cloudflare.list_record_ids(&self.hostname).await;
        if records.is_empty() {
            let msg = format!("未找到域名 {} 的DNS记录，请检查域名配置", self.hostname);
            self.abort(&msg).await;
            return RunOutcome::NoDnsRecords;
        }
        info!("Found {} DNS record(s) for {}", records.len(), self.hostname);

        // Positional pairing: the i-th record gets the i-th IP.
        let mut lines = Vec::with_capacity(records.len().min(ips.len()) + 1);
        let mut failed = Vec::new();
        for (record_id, ip) in records.iter().zip(&ips) {
            let result = self.cloudflare.update_record(record_id, &self.hostname, ip).await;
            debug!("Record {} -> {}: {}", result.record_id, ip, result.message);
            if !result.success {
                failed.push(result.record_id);
            }
            lines.push(result.message);
        }

        let attempted = lines.len();
        let succeeded = attempted - failed.len();
        if !failed.is_empty() {
            warn!("{} record update(s) failed: {}", failed.len(), failed.join(", "));
        }

        lines.push(summarize(ips.len(), records.len()));
        let content = lines.join("\n");

        self.notifier.notify(&content).await;

        RunOutcome::Updated {
            attempted,
            succeeded,
            content,
        }
    }

    async fn abort(&self, msg: &str) {
        warn!("{}", msg);
        self.notifier.notify(msg).await;
    }
}

/// Trailing summary line. Surplus IPs and untouched records are mutually
/// exclusive; equal counts mention neither.
pub fn summarize(ip_count: usize, record_count: usize) -> String {
    let updated = ip_count.min(record_count);
    let mut summary = format!("\n\n更新摘要：成功更新 {} 条记录", updated);

    if ip_count > record_count {
        summary.push_str(&format!("，忽略了 {} 个多余IP地址", ip_count - record_count));
    } else if ip_count < record_count {
        summary.push_str(&format!("，剩余 {} 条记录未更新", record_count - ip_count));
    }

    summary
}
