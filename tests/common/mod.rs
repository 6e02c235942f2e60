// Common test utilities for compose-fixture integration tests
use compose_fixture::{
    CommandOutput, CommandRunner, ComposeOptions, Composition, CompositionCallback,
    ScenarioContext, ScriptedRunner, SystemRunner,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// `docker inspect` output for a compose-managed container
#[allow(dead_code)]
pub fn inspect_json(name: &str, service: &str, ip: &str, running: bool) -> String {
    format!(
        r#"[{{
    "Id": "{name}-id",
    "Name": "/{name}",
    "State": {{"Running": {running}}},
    "Config": {{
        "Env": ["CORE_PEER_ID={service}", "PATH=/usr/local/bin"],
        "Labels": {{"com.docker.compose.service": "{service}"}}
    }},
    "NetworkSettings": {{
        "IPAddress": "{ip}",
        "Ports": {{"7051/tcp": [{{"HostIp": "0.0.0.0", "HostPort": "7051"}}]}},
        "Networks": {{"default": {{"IPAddress": "{ip}"}}}}
    }}
}}]"#
    )
}

#[derive(Default)]
struct EngineState {
    services: Vec<String>,
    warning: Option<String>,
    running: bool,
    siblings: Vec<String>,
    networks: Vec<String>,
    fail_subcommand: Option<String>,
    invocations: Vec<Vec<String>>,
}

/// Minimal stand-in for docker-compose + docker that tracks which
/// containers and networks exist for one project
#[allow(dead_code)]
pub struct FakeEngine {
    project: String,
    state: Mutex<EngineState>,
}

fn strip_file_args(args: &[String]) -> &[String] {
    let mut rest = args;
    while rest.len() >= 2 && rest[0] == "-f" {
        rest = &rest[2..];
    }
    rest
}

#[allow(dead_code)]
impl FakeEngine {
    pub fn new(project: &str, services: &[&str]) -> Arc<Self> {
        let state = EngineState {
            services: services.iter().map(|s| s.to_string()).collect(),
            networks: vec![format!("{}_default", project)],
            ..Default::default()
        };
        Arc::new(Self {
            project: project.to_string(),
            state: Mutex::new(state),
        })
    }

    /// Emit a warning line in `config --services` output
    pub fn set_warning(&self, line: &str) {
        self.state.lock().unwrap().warning = Some(line.to_string());
    }

    /// A container started outside the compose files
    pub fn add_sibling(&self, name: &str) {
        self.state.lock().unwrap().siblings.push(name.to_string());
    }

    /// Make compose `<subcommand>` exit with code 1
    pub fn fail_on(&self, subcommand: &str) {
        self.state.lock().unwrap().fail_subcommand = Some(subcommand.to_string());
    }

    /// What `ps -q` would report right now
    pub fn running_ids(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        if state.running {
            state.services.iter().map(|s| format!("{}-id", s)).collect()
        } else {
            Vec::new()
        }
    }

    pub fn siblings(&self) -> Vec<String> {
        self.state.lock().unwrap().siblings.clone()
    }

    pub fn networks(&self) -> Vec<String> {
        self.state.lock().unwrap().networks.clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .invocations
            .iter()
            .map(|argv| argv.join(" "))
            .collect()
    }

    /// Compose subcommands issued so far, without the `-f` arguments
    pub fn compose_subcommands(&self) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .invocations
            .iter()
            .filter(|argv| argv[0] == "docker-compose")
            .map(|argv| strip_file_args(&argv[1..]).join(" "))
            .collect()
    }

    fn compose(&self, state: &mut EngineState, args: &[String]) -> CommandOutput {
        let sub: Vec<&str> = strip_file_args(args).iter().map(String::as_str).collect();

        if state.fail_subcommand.is_some() && state.fail_subcommand.as_deref() == sub.first().copied()
        {
            return CommandOutput::failed(format!("ERROR: {} failed", sub.join(" ")), 1);
        }

        match sub.as_slice() {
            ["config", "--services"] => {
                let mut lines = Vec::new();
                if let Some(warning) = &state.warning {
                    lines.push(warning.clone());
                }
                lines.extend(state.services.iter().cloned());
                CommandOutput::ok(format!("{}\n", lines.join("\n")))
            }
            ["up", ..] => {
                state.running = true;
                CommandOutput::ok("")
            }
            ["ps", "-q"] if state.running => {
                let ids: Vec<String> = state.services.iter().map(|s| format!("{}-id", s)).collect();
                CommandOutput::ok(format!("{}\n", ids.join("\n")))
            }
            ["rm", "-f"] => {
                state.running = false;
                CommandOutput::ok("")
            }
            _ => CommandOutput::ok(""),
        }
    }

    fn docker(&self, state: &mut EngineState, args: &[String]) -> CommandOutput {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();

        match args.as_slice() {
            ["inspect", id] => {
                let service = id.strip_suffix("-id").unwrap_or(*id);
                match state.services.iter().position(|s| s == service) {
                    Some(index) if state.running => {
                        let name = format!("{}_{}_1", self.project, service);
                        let ip = format!("172.18.0.{}", index + 2);
                        CommandOutput::ok(inspect_json(&name, service, &ip, true))
                    }
                    _ => CommandOutput::failed(format!("Error: No such object: {}", id), 1),
                }
            }
            ["ps", "-qa", "--filter", _] => CommandOutput::ok(state.siblings.join("\n")),
            ["ps", "-f", _, "--format", _] => CommandOutput::ok(state.siblings.join("\n")),
            ["logs", name] => CommandOutput::ok(format!("log output of {}\n", name)),
            ["rm", "-f", id] => {
                state.siblings.retain(|s| s != id);
                CommandOutput::ok("")
            }
            ["network", "ls", "-q", "--filter", _] => {
                CommandOutput::ok(state.networks.join("\n"))
            }
            ["network", "rm", id] => {
                state.networks.retain(|n| n != id);
                CommandOutput::ok("")
            }
            _ => CommandOutput::ok(""),
        }
    }
}

impl CommandRunner for FakeEngine {
    fn execute(
        &self,
        argv: &[String],
        env: Option<&HashMap<String, String>>,
    ) -> compose_fixture::Result<CommandOutput> {
        // Callback scripts run for real
        if argv.first().map(String::as_str) == Some("sh") {
            return SystemRunner.execute(argv, env);
        }

        let mut state = self.state.lock().unwrap();
        state.invocations.push(argv.to_vec());

        let output = match argv.split_first() {
            Some((program, args)) if program == "docker-compose" => self.compose(&mut state, args),
            Some((program, args)) if program == "docker" => self.docker(&mut state, args),
            _ => CommandOutput::failed("command not found", 127),
        };
        Ok(output)
    }
}

#[allow(dead_code)]
pub fn engine_options(project: &str, engine: &Arc<FakeEngine>) -> ComposeOptions {
    let runner: Arc<dyn CommandRunner> = engine.clone();
    ComposeOptions::default()
        .with_project_name(project)
        .with_runner(runner)
}

#[allow(dead_code)]
pub fn scripted_options(project: &str, runner: &Arc<ScriptedRunner>) -> ComposeOptions {
    let runner: Arc<dyn CommandRunner> = runner.clone();
    ComposeOptions::default()
        .with_project_name(project)
        .with_runner(runner)
}

/// Shared, ordered log of callback activity
pub type EventLog = Arc<Mutex<Vec<String>>>;

#[allow(dead_code)]
pub fn new_event_log() -> EventLog {
    Arc::new(Mutex::new(Vec::new()))
}

#[allow(dead_code)]
pub fn events(log: &EventLog) -> Vec<String> {
    log.lock().unwrap().clone()
}

/// Callback that records every hook it sees and sets env vars
#[allow(dead_code)]
pub struct RecordingCallback {
    pub label: String,
    pub events: EventLog,
}

#[allow(dead_code)]
impl RecordingCallback {
    pub fn new(label: &str, events: &EventLog) -> Self {
        Self {
            label: label.to_string(),
            events: events.clone(),
        }
    }

    fn record(&self, hook: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.label, hook));
    }
}

impl CompositionCallback for RecordingCallback {
    fn composing(
        &self,
        _composition: &Composition,
        _ctx: &ScenarioContext,
    ) -> compose_fixture::Result<()> {
        self.record("composing");
        Ok(())
    }

    fn decomposing(
        &self,
        _composition: &Composition,
        _ctx: &ScenarioContext,
    ) -> compose_fixture::Result<()> {
        self.record("decomposing");
        Ok(())
    }

    fn get_env(
        &self,
        _composition: &Composition,
        _ctx: &ScenarioContext,
        env: &mut HashMap<String, String>,
    ) {
        self.record("get_env");
        // Later callbacks overwrite earlier ones
        env.insert("LAST_CALLBACK".to_string(), self.label.clone());
        env.insert(
            format!("CALLBACK_{}", self.label.to_uppercase()),
            "1".to_string(),
        );
    }

    fn name(&self) -> &str {
        &self.label
    }
}
