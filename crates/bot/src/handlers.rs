//! Reacts to inbound events: commands, free-text replies, and inline-button presses.

use std::sync::Arc;

use taskbot_core::render::escape_html;
use taskbot_core::{
    parse_menu_button, router, CaptureInput, Command, IntentKind, ListLimits, PendingIntents,
    StoreError, TaskError, TaskStore, TasksService,
};

use crate::constants;
use crate::error::{ResolveError, ServiceError};
use crate::gateway::{
    ChatId, InboundEvent, LocationResolver, Markup, MessageHandle, MessagingGateway,
    WeatherProvider,
};
use crate::weather::format_weather;

/// Owns the task store and answers every event for every chat, one at a time.
pub struct Assistant {
    store: TaskStore,
    intents: PendingIntents,
    limits: ListLimits,
    messenger: Arc<dyn MessagingGateway>,
    locations: Arc<dyn LocationResolver>,
    weather: Arc<dyn WeatherProvider>,
}

fn chat_key(chat_id: ChatId) -> String {
    chat_id.to_string()
}

impl Assistant {
    pub fn new(
        store: TaskStore,
        intents: PendingIntents,
        limits: ListLimits,
        messenger: Arc<dyn MessagingGateway>,
        locations: Arc<dyn LocationResolver>,
        weather: Arc<dyn WeatherProvider>,
    ) -> Self {
        Self {
            store,
            intents,
            limits,
            messenger,
            locations,
            weather,
        }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.store.save()
    }

    /// Handle one event to completion. Failures are logged and, for chat messages,
    /// answered with a short apology; they never propagate.
    pub async fn handle(&mut self, event: InboundEvent) {
        let chat_id = event.chat_id();
        let answers_in_chat = !matches!(event, InboundEvent::Action { .. });
        self.intents.prune();

        if let Err(err) = self.dispatch(event).await {
            tracing::warn!(chat_id, error = %err, "event handling failed");
            if answers_in_chat {
                if let Err(err) = self
                    .messenger
                    .deliver(chat_id, constants::INTERNAL_ERROR, None)
                    .await
                {
                    tracing::warn!(chat_id, error = %err, "failed to report error to chat");
                }
            }
        }
    }

    async fn dispatch(&mut self, event: InboundEvent) -> Result<(), ServiceError> {
        match event {
            InboundEvent::Command {
                chat_id,
                command,
                sender,
            } => {
                self.intents.discard(&chat_key(chat_id));
                self.on_command(chat_id, command, sender.as_deref()).await
            }
            InboundEvent::FreeText { chat_id, text } => self.on_text(chat_id, &text).await,
            InboundEvent::Action {
                chat_id,
                message,
                token,
                descriptor,
            } => self.on_action(chat_id, message, &token, &descriptor).await,
        }
    }

    async fn on_command(
        &mut self,
        chat_id: ChatId,
        command: Command,
        sender: Option<&str>,
    ) -> Result<(), ServiceError> {
        tracing::debug!(chat_id, ?command, "command");
        match command {
            Command::Start => {
                self.send(chat_id, &constants::greeting(sender), Some(&Markup::MainMenu))
                    .await
            }
            Command::Menu => {
                self.send(chat_id, constants::MENU_TITLE, Some(&Markup::MainMenu))
                    .await
            }
            Command::Help => {
                let text = constants::help_text(self.limits.recent_count);
                self.send(chat_id, &text, None).await
            }
            Command::TasksSection => self.send(chat_id, constants::TASKS_SECTION, None).await,
            Command::Add(Some(text)) => self.add_task(chat_id, &text).await,
            Command::Add(None) => {
                self.prompt(chat_id, constants::ADD_PROMPT, IntentKind::AddTask)
                    .await
            }
            Command::List(view) => {
                let rendered = router::show(&mut self.store, &chat_key(chat_id), view, self.limits);
                let markup = rendered.keyboard.map(Markup::Inline);
                self.send(chat_id, &rendered.text, markup.as_ref()).await
            }
            Command::Weather(Some(city)) => self.report_weather(chat_id, &city).await,
            Command::Weather(None) => {
                self.prompt(chat_id, constants::CITY_PROMPT, IntentKind::WeatherCity)
                    .await
            }
            Command::Unknown(name) => {
                tracing::debug!(chat_id, name = %name, "unknown command");
                self.send(chat_id, constants::UNKNOWN_COMMAND, None).await
            }
        }
    }

    async fn on_text(&mut self, chat_id: ChatId, text: &str) -> Result<(), ServiceError> {
        let key = chat_key(chat_id);
        if let Some(command) = parse_menu_button(text) {
            self.intents.discard(&key);
            return self.on_command(chat_id, command, None).await;
        }

        let input = CaptureInput::new(text);
        match self.intents.take(&key) {
            Some(IntentKind::AddTask) if input.is_empty() => {
                self.send(chat_id, constants::EMPTY_TASK_REPLY, None).await
            }
            Some(IntentKind::AddTask) => self.add_task(chat_id, &input.text).await,
            Some(IntentKind::WeatherCity) if input.is_empty() => {
                self.send(chat_id, constants::EMPTY_CITY_REPLY, None).await
            }
            Some(IntentKind::WeatherCity) => self.report_weather(chat_id, &input.text).await,
            None => {
                tracing::debug!(chat_id, "free text without a pending prompt ignored");
                Ok(())
            }
        }
    }

    async fn on_action(
        &mut self,
        chat_id: ChatId,
        message: MessageHandle,
        token: &str,
        descriptor: &str,
    ) -> Result<(), ServiceError> {
        let reply = router::route(&mut self.store, &chat_key(chat_id), descriptor, self.limits);
        tracing::debug!(chat_id, descriptor, notice = %reply.notice.text, "action routed");

        if let Err(err) = self
            .messenger
            .notify(token, &reply.notice.text, reply.notice.urgent)
            .await
        {
            tracing::warn!(chat_id, error = %err, "failed to answer interaction");
        }

        if let Some(view) = reply.view {
            self.messenger
                .edit(chat_id, message, &view.text, view.keyboard.as_ref())
                .await?;
        }
        Ok(())
    }

    async fn add_task(&mut self, chat_id: ChatId, text: &str) -> Result<(), ServiceError> {
        let added = TasksService::new(&mut self.store, chat_key(chat_id)).add(text);
        match added {
            Ok(id) => self.send(chat_id, &constants::task_added(id), None).await,
            Err(TaskError::EmptyText) => {
                self.send(chat_id, constants::EMPTY_TASK_REPLY, None).await
            }
            Err(err) => {
                tracing::warn!(chat_id, error = %err, "task not added");
                self.send(chat_id, constants::INTERNAL_ERROR, None).await
            }
        }
    }

    async fn report_weather(&self, chat_id: ChatId, city: &str) -> Result<(), ServiceError> {
        let progress = self
            .messenger
            .deliver(chat_id, &constants::looking_up(city), None)
            .await?;

        let place = match self.locations.resolve(city).await {
            Ok(place) => place,
            Err(err) => {
                tracing::warn!(chat_id, city, error = %err, "location lookup failed");
                let text = format!("⚠️ {}", escape_html(&resolve_failure(city, &err)));
                self.messenger.edit(chat_id, progress, &text, None).await?;
                return Ok(());
            }
        };

        self.messenger
            .edit(chat_id, progress, constants::LOCATION_FOUND, None)
            .await?;

        let report = match self.weather.fetch(place.coordinates).await {
            Ok(snapshot) => {
                let name = if place.display_name.trim().is_empty() {
                    city
                } else {
                    place.display_name.as_str()
                };
                format_weather(&snapshot, name)
            }
            Err(err) => {
                tracing::warn!(chat_id, city, error = %err, "weather fetch failed");
                format!("⚠️ Weather error: {}", escape_html(&err.to_string()))
            }
        };
        self.messenger.edit(chat_id, progress, &report, None).await?;
        Ok(())
    }

    async fn prompt(
        &mut self,
        chat_id: ChatId,
        text: &str,
        kind: IntentKind,
    ) -> Result<(), ServiceError> {
        self.send(chat_id, text, Some(&Markup::ForceReply)).await?;
        self.intents.arm(&chat_key(chat_id), kind);
        Ok(())
    }

    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<&Markup>,
    ) -> Result<(), ServiceError> {
        self.messenger.deliver(chat_id, text, markup).await?;
        Ok(())
    }
}

fn resolve_failure(city: &str, err: &ResolveError) -> String {
    match err {
        ResolveError::NotFound { .. } => format!("Could not find coordinates for '{city}'."),
        ResolveError::Service(ServiceError::Timeout) => {
            "The geocoding service did not respond in time.".to_string()
        }
        ResolveError::Service(err) => format!("Geocoding service error: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use taskbot_core::{JsonFile, Keyboard, TaskStatus, ViewKind};

    use crate::gateway::{Coordinates, EditOutcome, Place};
    use crate::weather::WeatherSnapshot;

    const CHAT: ChatId = 42;

    #[derive(Debug, Clone, PartialEq)]
    enum Sent {
        Deliver {
            text: String,
            markup: Option<Markup>,
        },
        Edit {
            message: MessageHandle,
            text: String,
            keyboard: Option<Keyboard>,
        },
        Notify {
            token: String,
            text: String,
            urgent: bool,
        },
    }

    #[derive(Default)]
    struct RecordingMessenger {
        sent: Mutex<Vec<Sent>>,
    }

    impl RecordingMessenger {
        fn take(&self) -> Vec<Sent> {
            std::mem::take(&mut *self.sent.lock().unwrap())
        }
    }

    #[async_trait]
    impl MessagingGateway for RecordingMessenger {
        async fn deliver(
            &self,
            _chat_id: ChatId,
            text: &str,
            markup: Option<&Markup>,
        ) -> Result<MessageHandle, ServiceError> {
            let mut sent = self.sent.lock().unwrap();
            sent.push(Sent::Deliver {
                text: text.to_string(),
                markup: markup.cloned(),
            });
            Ok(MessageHandle(sent.len() as i64))
        }

        async fn edit(
            &self,
            _chat_id: ChatId,
            message: MessageHandle,
            text: &str,
            keyboard: Option<&Keyboard>,
        ) -> Result<EditOutcome, ServiceError> {
            self.sent.lock().unwrap().push(Sent::Edit {
                message,
                text: text.to_string(),
                keyboard: keyboard.cloned(),
            });
            Ok(EditOutcome::Edited)
        }

        async fn notify(&self, token: &str, text: &str, urgent: bool) -> Result<(), ServiceError> {
            self.sent.lock().unwrap().push(Sent::Notify {
                token: token.to_string(),
                text: text.to_string(),
                urgent,
            });
            Ok(())
        }
    }

    struct FixedResolver {
        known: Option<Place>,
    }

    #[async_trait]
    impl LocationResolver for FixedResolver {
        async fn resolve(&self, query: &str) -> Result<Place, ResolveError> {
            self.known.clone().ok_or_else(|| ResolveError::NotFound {
                query: query.to_string(),
            })
        }
    }

    struct FixedWeather {
        available: bool,
    }

    #[async_trait]
    impl WeatherProvider for FixedWeather {
        async fn fetch(&self, _at: Coordinates) -> Result<WeatherSnapshot, ServiceError> {
            if !self.available {
                return Err(ServiceError::Timeout);
            }
            Ok(WeatherSnapshot {
                air_c: Some(21.0),
                description: Some("Sunny".into()),
                emoji: Some("☀️".into()),
                ..WeatherSnapshot::default()
            })
        }
    }

    fn berlin() -> Place {
        Place {
            coordinates: Coordinates {
                latitude: 52.52,
                longitude: 13.4,
            },
            display_name: "Berlin, Germany".into(),
        }
    }

    fn assistant_with(
        store: TaskStore,
        place: Option<Place>,
        weather_available: bool,
    ) -> (Assistant, Arc<RecordingMessenger>) {
        let messenger = Arc::new(RecordingMessenger::default());
        let assistant = Assistant::new(
            store,
            PendingIntents::default(),
            ListLimits::default(),
            messenger.clone(),
            Arc::new(FixedResolver { known: place }),
            Arc::new(FixedWeather {
                available: weather_available,
            }),
        );
        (assistant, messenger)
    }

    fn assistant() -> (Assistant, Arc<RecordingMessenger>) {
        assistant_with(TaskStore::in_memory(), Some(berlin()), true)
    }

    fn command(command: Command) -> InboundEvent {
        InboundEvent::Command {
            chat_id: CHAT,
            command,
            sender: Some("Ana".into()),
        }
    }

    fn text(text: &str) -> InboundEvent {
        InboundEvent::FreeText {
            chat_id: CHAT,
            text: text.into(),
        }
    }

    fn press(descriptor: &str) -> InboundEvent {
        InboundEvent::Action {
            chat_id: CHAT,
            message: MessageHandle(99),
            token: "cb".into(),
            descriptor: descriptor.into(),
        }
    }

    fn tasks_of(assistant: &Assistant) -> Vec<(u64, String, TaskStatus)> {
        assistant
            .store()
            .chat(&CHAT.to_string())
            .map(|chat| {
                chat.tasks
                    .iter()
                    .map(|task| (task.id, task.text.clone(), task.status))
                    .collect()
            })
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn add_command_creates_task_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user_tasks.json");
        let store = TaskStore::open_file(JsonFile::new(&path));
        let (mut assistant, messenger) = assistant_with(store, None, true);

        assistant
            .handle(command(Command::Add(Some("buy milk".into()))))
            .await;

        assert_eq!(
            messenger.take(),
            vec![Sent::Deliver {
                text: "✅ Task added! (ID: <code>1</code>)".into(),
                markup: None,
            }]
        );
        let reloaded = TaskStore::open_file(JsonFile::new(&path));
        let chat = reloaded.chat("42").expect("chat persisted");
        assert_eq!(chat.tasks[0].text, "buy milk");
        assert_eq!(chat.next_id, 2);
    }

    #[tokio::test]
    async fn add_prompt_then_reply_adds_task() {
        let (mut assistant, messenger) = assistant();

        assistant.handle(command(Command::Add(None))).await;
        assistant.handle(text("  call mom  ")).await;

        assert_eq!(
            messenger.take(),
            vec![
                Sent::Deliver {
                    text: constants::ADD_PROMPT.into(),
                    markup: Some(Markup::ForceReply),
                },
                Sent::Deliver {
                    text: constants::task_added(1),
                    markup: None,
                },
            ]
        );
        assert_eq!(
            tasks_of(&assistant),
            vec![(1, "call mom".to_string(), TaskStatus::Pending)]
        );
    }

    #[tokio::test]
    async fn empty_reply_gets_hint_and_is_not_rearmed() {
        let (mut assistant, messenger) = assistant();

        assistant.handle(command(Command::Add(None))).await;
        assistant.handle(text("   ")).await;
        assistant.handle(text("later text")).await;

        let sent = messenger.take();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            Sent::Deliver {
                text: constants::EMPTY_TASK_REPLY.into(),
                markup: None,
            }
        );
        assert!(tasks_of(&assistant).is_empty());
    }

    #[tokio::test]
    async fn other_commands_discard_pending_prompt() {
        let (mut assistant, messenger) = assistant();

        assistant.handle(command(Command::Add(None))).await;
        assistant.handle(command(Command::Help)).await;
        assistant.handle(text("not a task")).await;

        assert_eq!(messenger.take().len(), 2);
        assert!(tasks_of(&assistant).is_empty());
    }

    #[tokio::test]
    async fn free_text_without_prompt_is_ignored() {
        let (mut assistant, messenger) = assistant();
        assistant.handle(text("hello")).await;
        assert!(messenger.take().is_empty());
    }

    #[tokio::test]
    async fn start_greets_with_main_menu() {
        let (mut assistant, messenger) = assistant();
        assistant.handle(command(Command::Start)).await;

        let sent = messenger.take();
        match &sent[..] {
            [Sent::Deliver { text, markup }] => {
                assert!(text.contains("Hi, Ana!"));
                assert_eq!(markup, &Some(Markup::MainMenu));
            }
            other => panic!("unexpected messages: {other:?}"),
        }
    }

    #[tokio::test]
    async fn list_then_complete_edits_the_view() {
        let (mut assistant, messenger) = assistant();
        assistant
            .handle(command(Command::Add(Some("buy milk".into()))))
            .await;
        assistant.handle(command(Command::List(ViewKind::All))).await;

        let sent = messenger.take();
        match &sent[1] {
            Sent::Deliver {
                text,
                markup: Some(Markup::Inline(keyboard)),
            } => {
                assert!(text.contains("buy milk"));
                assert_eq!(keyboard.rows[0][0].action.encode(), "list_done_1_1");
            }
            other => panic!("expected list with keyboard, got {other:?}"),
        }

        assistant.handle(press("list_done_1_1")).await;
        let sent = messenger.take();
        assert_eq!(
            sent[0],
            Sent::Notify {
                token: "cb".into(),
                text: "✅ Task 1 completed!".into(),
                urgent: false,
            }
        );
        match &sent[1] {
            Sent::Edit { message, text, .. } => {
                assert_eq!(*message, MessageHandle(99));
                assert!(text.contains("✔️"));
            }
            other => panic!("expected edit, got {other:?}"),
        }
        assert_eq!(tasks_of(&assistant)[0].2, TaskStatus::Completed);
    }

    #[tokio::test]
    async fn invalid_action_only_alerts() {
        let (mut assistant, messenger) = assistant();
        assistant.handle(press("list_explode_1_1")).await;
        assert_eq!(
            messenger.take(),
            vec![Sent::Notify {
                token: "cb".into(),
                text: router::INVALID_ACTION.into(),
                urgent: true,
            }]
        );
    }

    #[tokio::test]
    async fn weather_flow_edits_progress_message() {
        let (mut assistant, messenger) = assistant();
        assistant
            .handle(command(Command::Weather(Some("Berlin".into()))))
            .await;

        let sent = messenger.take();
        assert_eq!(sent.len(), 3);
        assert_eq!(
            sent[0],
            Sent::Deliver {
                text: "🌍 Looking up 'Berlin'...".into(),
                markup: None,
            }
        );
        assert_eq!(
            sent[1],
            Sent::Edit {
                message: MessageHandle(1),
                text: constants::LOCATION_FOUND.into(),
                keyboard: None,
            }
        );
        match &sent[2] {
            Sent::Edit { text, .. } => {
                assert!(text.starts_with("<b>Berlin, Germany</b> | Now ☀️"));
                assert!(text.contains("21°C"));
            }
            other => panic!("expected weather report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unknown_city_reports_lookup_failure() {
        let (mut assistant, messenger) = assistant_with(TaskStore::in_memory(), None, true);
        assistant
            .handle(command(Command::Weather(Some("Atlantis".into()))))
            .await;

        let sent = messenger.take();
        assert_eq!(sent.len(), 2);
        assert_eq!(
            sent[1],
            Sent::Edit {
                message: MessageHandle(1),
                text: "⚠️ Could not find coordinates for 'Atlantis'.".into(),
                keyboard: None,
            }
        );
    }

    #[tokio::test]
    async fn weather_failure_is_reported() {
        let (mut assistant, messenger) =
            assistant_with(TaskStore::in_memory(), Some(berlin()), false);
        assistant
            .handle(command(Command::Weather(Some("Berlin".into()))))
            .await;

        let sent = messenger.take();
        match sent.last() {
            Some(Sent::Edit { text, .. }) => {
                assert_eq!(text, "⚠️ Weather error: service did not respond in time")
            }
            other => panic!("expected error edit, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn weather_button_prompts_for_city() {
        let (mut assistant, messenger) = assistant();
        assistant.handle(text("☀️ Weather")).await;
        assistant.handle(text("Berlin")).await;

        let sent = messenger.take();
        assert_eq!(
            sent[0],
            Sent::Deliver {
                text: constants::CITY_PROMPT.into(),
                markup: Some(Markup::ForceReply),
            }
        );
        assert_eq!(sent.len(), 4);
    }
}
