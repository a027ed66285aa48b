//! Test doubles shared by the unit tests

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::config::AgentResources;
use crate::custom_resource::{CustomResourceResponse, ResponseSender};
use crate::error::ProvisionError;
use crate::prompts::PromptOverrides;
use crate::services::{AgentApi, CrawlerApi, ServiceError, VectorIndexApi};
use crate::waiter::{Sleeper, StatusPoller};

/// Resources matching the identifiers the mocks expect
pub fn resources() -> AgentResources {
    AgentResources {
        crawler_name: "sales-crawler".to_string(),
        knowledge_base_id: "kb-1".to_string(),
        data_source_id: "ds-1".to_string(),
        agent_id: "agent-1".to_string(),
        agent_name: "sales-agent".to_string(),
        agent_alias_name: "live".to_string(),
        agent_alias_description: "agent alias description".to_string(),
        agent_resource_role_arn: "arn:aws:iam::123456789012:role/agent".to_string(),
        update_agent_prompts: false,
        preprocessing_template_path: None,
        orchestration_template_path: None,
    }
}

/// Records requested delays instead of sleeping
#[derive(Debug, Default)]
pub struct RecordingSleeper {
    delays: Mutex<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn recorded(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().unwrap().push(duration);
    }
}

/// Values returned in order; the last one repeats once the script runs out
#[derive(Debug, Default)]
struct Script<T> {
    values: Vec<T>,
    cursor: AtomicUsize,
}

impl<T: Clone> Script<T> {
    fn new(values: Vec<T>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }

    fn next(&self) -> Option<T> {
        let index = self.cursor.fetch_add(1, Ordering::SeqCst);
        self.values
            .get(index)
            .or_else(|| self.values.last())
            .cloned()
    }
}

fn script(values: &[&str]) -> Script<String> {
    Script::new(values.iter().map(|v| v.to_string()).collect())
}

fn next_status(script: &Script<String>, operation: &'static str) -> Result<String, ServiceError> {
    script.next().ok_or(ServiceError::MissingField {
        operation,
        field: "status",
    })
}

fn not_found(operation: &'static str) -> ServiceError {
    ServiceError::Api {
        operation,
        code: Some("ResourceNotFoundException".to_string()),
        message: "resource does not exist".to_string(),
    }
}

/// Status poller driven by a fixed script
#[derive(Debug)]
pub struct ScriptedPoller {
    script: Script<String>,
    calls: AtomicUsize,
    fail_after: Option<usize>,
}

impl ScriptedPoller {
    pub fn new(statuses: &[&str]) -> Self {
        Self {
            script: script(statuses),
            calls: AtomicUsize::new(0),
            fail_after: None,
        }
    }

    pub fn repeating(status: &str) -> Self {
        Self::new(&[status])
    }

    /// Return an error from every poll after the first `polls`
    pub fn failing_after(mut self, polls: usize) -> Self {
        self.fail_after = Some(polls);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusPoller for ScriptedPoller {
    type Error = String;

    async fn poll_status(&self, _handle: &str) -> Result<String, String> {
        let poll = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if matches!(self.fail_after, Some(limit) if poll > limit) {
            return Err(format!("scripted failure on poll {}", poll));
        }
        self.script
            .next()
            .ok_or_else(|| "empty status script".to_string())
    }
}

#[derive(Debug)]
pub struct MockGlue {
    states: Script<String>,
    started: Mutex<Vec<String>>,
    polls: AtomicUsize,
    fail_start: bool,
}

impl MockGlue {
    pub fn new(states: &[&str]) -> Self {
        Self {
            states: script(states),
            started: Mutex::new(Vec::new()),
            polls: AtomicUsize::new(0),
            fail_start: false,
        }
    }

    /// StartCrawler fails as if the crawler were already running
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    pub fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CrawlerApi for MockGlue {
    async fn start_crawler(&self, crawler_name: &str) -> Result<(), ServiceError> {
        if self.fail_start {
            return Err(ServiceError::Api {
                operation: "StartCrawler",
                code: Some("CrawlerRunningException".to_string()),
                message: "crawler is already running".to_string(),
            });
        }
        self.started.lock().unwrap().push(crawler_name.to_string());
        Ok(())
    }

    async fn crawler_state(&self, _crawler_name: &str) -> Result<String, ServiceError> {
        self.polls.fetch_add(1, Ordering::SeqCst);
        next_status(&self.states, "GetCrawler")
    }
}

/// Bedrock Agent double. Every call is recorded as a short string.
#[derive(Debug, Default)]
pub struct MockAgents {
    ingestion: Script<String>,
    agent: Script<String>,
    alias: Script<String>,
    alias_ids: Vec<String>,
    agent_missing: bool,
    calls: Mutex<Vec<String>>,
}

impl MockAgents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ingestion(mut self, statuses: &[&str]) -> Self {
        self.ingestion = script(statuses);
        self
    }

    pub fn with_agent(mut self, statuses: &[&str]) -> Self {
        self.agent = script(statuses);
        self
    }

    pub fn with_alias(mut self, statuses: &[&str]) -> Self {
        self.alias = script(statuses);
        self
    }

    pub fn with_alias_ids(mut self, ids: &[&str]) -> Self {
        self.alias_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    /// The agent no longer exists
    pub fn agent_missing(mut self) -> Self {
        self.agent_missing = true;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c == call)
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl AgentApi for MockAgents {
    async fn start_ingestion_job(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
    ) -> Result<String, ServiceError> {
        self.record(format!(
            "start_ingestion_job {} {}",
            knowledge_base_id, data_source_id
        ));
        Ok("job-1".to_string())
    }

    async fn ingestion_job_status(
        &self,
        knowledge_base_id: &str,
        data_source_id: &str,
        ingestion_job_id: &str,
    ) -> Result<String, ServiceError> {
        self.record(format!(
            "ingestion_job_status {} {} {}",
            knowledge_base_id, data_source_id, ingestion_job_id
        ));
        next_status(&self.ingestion, "GetIngestionJob")
    }

    async fn prepare_agent(&self, agent_id: &str) -> Result<(), ServiceError> {
        self.record(format!("prepare_agent {}", agent_id));
        Ok(())
    }

    async fn agent_status(&self, agent_id: &str) -> Result<String, ServiceError> {
        self.record(format!("agent_status {}", agent_id));
        next_status(&self.agent, "GetAgent")
    }

    async fn create_agent_alias(
        &self,
        agent_id: &str,
        alias_name: &str,
        _description: &str,
    ) -> Result<String, ServiceError> {
        self.record(format!("create_agent_alias {} {}", agent_id, alias_name));
        Ok("alias-1".to_string())
    }

    async fn agent_alias_status(
        &self,
        agent_id: &str,
        alias_id: &str,
    ) -> Result<String, ServiceError> {
        self.record(format!("agent_alias_status {} {}", agent_id, alias_id));
        next_status(&self.alias, "GetAgentAlias")
    }

    async fn update_agent_prompts(
        &self,
        agent_id: &str,
        agent_name: &str,
        _agent_resource_role_arn: &str,
        _prompts: &PromptOverrides,
    ) -> Result<(), ServiceError> {
        self.record(format!("update_agent_prompts {} {}", agent_id, agent_name));
        Ok(())
    }

    async fn list_agent_alias_ids(&self, agent_id: &str) -> Result<Vec<String>, ServiceError> {
        self.record(format!("list_agent_alias_ids {}", agent_id));
        if self.agent_missing {
            return Err(not_found("ListAgentAliases"));
        }
        Ok(self.alias_ids.clone())
    }

    async fn delete_agent_alias(
        &self,
        agent_id: &str,
        alias_id: &str,
    ) -> Result<(), ServiceError> {
        self.record(format!("delete_agent_alias {} {}", agent_id, alias_id));
        Ok(())
    }

    async fn delete_agent(&self, agent_id: &str) -> Result<(), ServiceError> {
        self.record(format!("delete_agent {}", agent_id));
        if self.agent_missing {
            return Err(not_found("DeleteAgent"));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct MockIndices {
    exists: Script<bool>,
    created: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    delete_not_found: bool,
}

impl MockIndices {
    /// `exists` is what successive existence checks report
    pub fn new(exists: &[bool]) -> Self {
        Self {
            exists: Script::new(exists.to_vec()),
            created: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
            delete_not_found: false,
        }
    }

    pub fn delete_not_found(mut self) -> Self {
        self.delete_not_found = true;
        self
    }

    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl VectorIndexApi for MockIndices {
    async fn create_index(
        &self,
        index_name: &str,
        _body: &serde_json::Value,
    ) -> Result<(), ServiceError> {
        self.created.lock().unwrap().push(index_name.to_string());
        Ok(())
    }

    async fn index_exists(&self, _index_name: &str) -> Result<bool, ServiceError> {
        Ok(self.exists.next().unwrap_or(false))
    }

    async fn delete_index(&self, index_name: &str) -> Result<(), ServiceError> {
        self.deleted.lock().unwrap().push(index_name.to_string());
        if self.delete_not_found {
            return Err(ServiceError::Http {
                operation: "DeleteIndex",
                status: 404,
                body: "index_not_found_exception".to_string(),
            });
        }
        Ok(())
    }
}

/// Keeps every response instead of sending it
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<(String, CustomResourceResponse)>>,
    fail: bool,
}

impl RecordingSender {
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn sent(&self) -> Vec<(String, CustomResourceResponse)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl ResponseSender for RecordingSender {
    async fn send(
        &self,
        response_url: &str,
        response: &CustomResourceResponse,
    ) -> Result<(), ProvisionError> {
        if self.fail {
            return Err(ProvisionError::ResponseDelivery("HTTP 403: expired".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((response_url.to_string(), response.clone()));
        Ok(())
    }
}
