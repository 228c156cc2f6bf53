//! Bot host: owns the modules, their aliases and settings, and dispatches
//! incoming messages to them.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::RwLock, task::JoinHandle};

use crate::{
    domain::{Room, RoomId, TextEvent, UserId},
    errors::Error,
    module::{BotModule, MessageContext},
    ports::{ChatPort, SettingsMap, SettingsStore},
    Result,
};

/// Text sent when a non-owner tries an owner-only operation.
pub const NOT_OWNER_REPLY: &str = "Operation restricted to bot owners";

struct ModuleSlot {
    module: Arc<dyn BotModule>,
    enabled: AtomicBool,
}

/// Summary of a registered module (for `!help`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModuleInfo {
    pub name: String,
    pub help: String,
    pub enabled: bool,
}

pub struct Bot {
    chat: Arc<dyn ChatPort>,
    settings: Arc<dyn SettingsStore>,
    owners: Vec<UserId>,
    prefix: String,
    modules: Vec<ModuleSlot>,
    aliases: RwLock<HashMap<String, String>>,
}

impl Bot {
    pub fn new(
        chat: Arc<dyn ChatPort>,
        settings: Arc<dyn SettingsStore>,
        owners: Vec<UserId>,
        prefix: impl Into<String>,
    ) -> Self {
        Self {
            chat,
            settings,
            owners,
            prefix: prefix.into(),
            modules: Vec::new(),
            aliases: RwLock::new(HashMap::new()),
        }
    }

    /// Register a module. Names must be unique.
    pub fn register(&mut self, module: Arc<dyn BotModule>) -> Result<()> {
        let name = module.name().to_string();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(Error::Config(format!("invalid module name {name:?}")));
        }
        if self.slot(&name).is_some() {
            return Err(Error::Config(format!("module {name} registered twice")));
        }
        tracing::debug!(module = %name, "registered module");
        self.modules.push(ModuleSlot {
            module,
            enabled: AtomicBool::new(true),
        });
        Ok(())
    }

    /// Register a module whose construction may have failed.
    ///
    /// A failed build (e.g. a sub-command without documentation) is logged and
    /// only that module is left out. Returns whether the module was registered.
    pub fn register_built<M>(&mut self, name: &str, built: Result<M>) -> bool
    where
        M: BotModule + 'static,
    {
        let registered = built.and_then(|module| self.register(Arc::new(module)));
        if let Err(e) = &registered {
            tracing::error!(module = name, error = %e, "module not registered");
        }
        registered.is_ok()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn module(&self, name: &str) -> Option<&Arc<dyn BotModule>> {
        self.slot(name).map(|s| &s.module)
    }

    /// Registered modules in registration order.
    pub fn modules(&self) -> Vec<ModuleInfo> {
        self.modules
            .iter()
            .map(|s| ModuleInfo {
                name: s.module.name().to_string(),
                help: s.module.help(),
                enabled: s.enabled.load(Ordering::Relaxed),
            })
            .collect()
    }

    /// Resolve a module name or module alias.
    pub async fn resolve(&self, name: &str) -> Option<Arc<dyn BotModule>> {
        if let Some(slot) = self.slot(name) {
            return Some(slot.module.clone());
        }
        let target = self.aliases.read().await.get(name).cloned()?;
        self.module(&target).cloned()
    }

    pub async fn module_alias(&self, alias: &str) -> Option<String> {
        self.aliases.read().await.get(alias).cloned()
    }

    /// Add aliases by which `module` can be invoked.
    ///
    /// Names that are modules are never aliased. An alias held by another
    /// module is only taken over with `force`.
    pub async fn add_module_aliases(&self, module: &str, names: &[String], force: bool) {
        let mut aliases = self.aliases.write().await;
        for name in names {
            if self.slot(name).is_some() {
                tracing::info!(module, alias = %name, "not aliasing, it is already a module");
                continue;
            }
            match aliases.get(name) {
                Some(prev) if prev == module => continue,
                Some(prev) if !force => {
                    tracing::info!(module, alias = %name, current = %prev, "not aliasing, already an alias");
                    continue;
                }
                Some(prev) => {
                    tracing::debug!(module, alias = %name, previous = %prev, "overriding alias");
                }
                None => {}
            }
            aliases.insert(name.clone(), module.to_string());
        }
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.slot(name)
            .is_some_and(|s| s.enabled.load(Ordering::Relaxed))
    }

    pub fn enable(&self, name: &str) -> Result<()> {
        let slot = self
            .slot(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        slot.enabled.store(true, Ordering::Relaxed);
        Ok(())
    }

    pub fn disable(&self, name: &str) -> Result<()> {
        let slot = self
            .slot(name)
            .ok_or_else(|| Error::UnknownModule(name.to_string()))?;
        if !slot.module.can_be_disabled() {
            return Err(Error::ModuleCannotBeDisabled(name.to_string()));
        }
        slot.enabled.store(false, Ordering::Relaxed);
        Ok(())
    }

    pub fn is_owner(&self, user: &UserId) -> bool {
        self.owners.contains(user)
    }

    pub fn must_be_owner(&self, event: &TextEvent) -> Result<()> {
        if self.is_owner(&event.sender) {
            Ok(())
        } else {
            Err(Error::NotOwner)
        }
    }

    pub async fn send_text(&self, room: &RoomId, text: &str) -> Result<()> {
        self.chat.send_text(room, text).await
    }

    pub async fn send_html(&self, room: &RoomId, html: &str, plain: &str) -> Result<()> {
        self.chat.send_html(room, html, plain).await
    }

    /// Display name of `user`, falling back to the raw user id.
    pub async fn display_name(&self, room: &RoomId, user: &UserId) -> String {
        match self.chat.display_name(room, user).await {
            Ok(Some(name)) if !name.trim().is_empty() => name,
            Ok(_) => user.0.clone(),
            Err(e) => {
                tracing::warn!(room = %room, user = %user, error = %e, "display name lookup failed");
                user.0.clone()
            }
        }
    }

    /// Persist every module's settings (plus its `enabled` flag).
    pub async fn save_settings(&self) -> Result<()> {
        let mut all = SettingsMap::new();
        for slot in &self.modules {
            let mut data = slot.module.settings().await;
            data.insert(
                "enabled".to_string(),
                serde_json::Value::Bool(slot.enabled.load(Ordering::Relaxed)),
            );
            all.insert(slot.module.name().to_string(), data);
        }
        self.settings.save(&all).await
    }

    /// Apply stored settings to the registered modules.
    pub async fn load_settings(&self) -> Result<()> {
        let all = self.settings.load().await?;
        for slot in &self.modules {
            let Some(data) = all.get(slot.module.name()) else {
                continue;
            };
            if let Some(enabled) = data.get("enabled").and_then(|v| v.as_bool()) {
                slot.enabled.store(enabled, Ordering::Relaxed);
            }
            slot.module.apply_settings(data).await?;
        }
        Ok(())
    }

    /// Load settings, then start every module and register its aliases.
    pub async fn start(&self) -> Result<()> {
        if let Err(e) = self.load_settings().await {
            tracing::warn!(error = %e, "failed to load module settings");
        }
        for slot in &self.modules {
            let module = &slot.module;
            if let Err(e) = module.start(self).await {
                tracing::error!(module = module.name(), error = %e, "module failed to start");
                continue;
            }
            self.add_module_aliases(module.name(), &module.aliases(), false)
                .await;
        }
        Ok(())
    }

    pub async fn stop(&self) {
        for slot in &self.modules {
            if let Err(e) = slot.module.stop(self).await {
                tracing::warn!(module = slot.module.name(), error = %e, "module failed to stop");
            }
        }
    }

    /// Poll every enabled module once.
    pub async fn poll(&self, pollcount: u64) {
        for slot in &self.modules {
            if !slot.enabled.load(Ordering::Relaxed) {
                continue;
            }
            if let Err(e) = slot.module.poll(self, pollcount).await {
                tracing::warn!(module = slot.module.name(), error = %e, "module poll failed");
            }
        }
    }

    /// Poll all modules every `interval` until the task is aborted.
    pub fn spawn_poller(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            let mut pollcount = 0u64;
            loop {
                ticker.tick().await;
                pollcount += 1;
                self.poll(pollcount).await;
            }
        })
    }

    /// Dispatch a room message to the module it addresses, if any.
    ///
    /// Module failures are logged and dropped. Only a failure to report an
    /// owner-only refusal back to the room is returned.
    pub async fn handle_message(&self, room: &Room, event: &TextEvent) -> Result<()> {
        let Some(token) = event.command_token() else {
            return Ok(());
        };
        let Some(name) = token.strip_prefix(self.prefix.as_str()) else {
            return Ok(());
        };
        if name.is_empty() {
            return Ok(());
        }

        let Some(module) = self.resolve(name).await else {
            tracing::debug!(command = name, "no module for command");
            return Ok(());
        };
        if !self.is_enabled(module.name()) {
            tracing::debug!(module = module.name(), "module disabled, ignoring message");
            return Ok(());
        }

        tracing::debug!(
            module = module.name(),
            room = %room.id,
            sender = %event.sender,
            "dispatching message"
        );
        let ctx = MessageContext {
            bot: self,
            room,
            event,
        };
        match module.message(&ctx).await {
            Ok(()) => Ok(()),
            Err(Error::NotOwner) => self.send_text(&room.id, NOT_OWNER_REPLY).await,
            Err(e) => {
                tracing::warn!(module = module.name(), error = %e, "module failed to handle message");
                Ok(())
            }
        }
    }

    fn slot(&self, name: &str) -> Option<&ModuleSlot> {
        self.modules.iter().find(|s| s.module.name() == name)
    }
}
