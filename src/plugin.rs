//! Bevy plugin that hosts an [`EditSession`] as a resource
//!
//! Settings changes are pushed into the session and the session's queued
//! notifications are forwarded as [`SessionEvent`] messages, so other plugins
//! can react to fold and layout changes with a `MessageReader`.

use bevy::prelude::*;

use crate::events::SessionEvent;
use crate::session::EditSession;
use crate::settings::LayoutSettings;

/// Fold and soft-wrap layout plugin
#[derive(Default)]
pub struct LayoutPlugin {
    settings: LayoutSettings,
    text: String,
}

impl LayoutPlugin {
    /// Create plugin with custom settings
    pub fn with_settings(settings: LayoutSettings) -> Self {
        Self {
            settings,
            ..default()
        }
    }

    /// Initial document text of the session
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }
}

impl Plugin for LayoutPlugin {
    fn build(&self, app: &mut App) {
        // Settings inserted by the host app win over the plugin's
        if !app.world().contains_resource::<LayoutSettings>() {
            app.insert_resource(self.settings.clone());
        }
        app.insert_resource(EditSession::new(&self.text));

        app.add_message::<SessionEvent>();

        app.add_systems(
            Update,
            (apply_layout_settings, forward_session_events).chain(),
        );
    }
}

/// Push changed settings into the session
fn apply_layout_settings(settings: Res<LayoutSettings>, mut session: ResMut<EditSession>) {
    if !settings.is_changed() {
        return;
    }
    session.apply_settings(&settings);
}

/// Forward queued session notifications as messages
fn forward_session_events(
    mut session: ResMut<EditSession>,
    mut writer: MessageWriter<SessionEvent>,
) {
    let events = session.drain_events();
    if !events.is_empty() {
        writer.write_batch(events);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display_map::Range;

    #[derive(Resource, Default)]
    struct Received(Vec<SessionEvent>);

    fn collect_events(mut reader: MessageReader<SessionEvent>, mut received: ResMut<Received>) {
        received.0.extend(reader.read().cloned());
    }

    fn app_with(settings: LayoutSettings) -> App {
        let mut app = App::new();
        app.add_plugins(LayoutPlugin::with_settings(settings).with_text("fn a() {\n    b\n}"));
        app.init_resource::<Received>();
        app.add_systems(Update, collect_events.after(forward_session_events));
        app
    }

    #[test]
    fn test_settings_applied_on_first_update() {
        let mut app = app_with(LayoutSettings::wrapped());
        app.update();

        let session = app.world().resource::<EditSession>();
        assert!(session.use_wrap_mode());
        assert_eq!(session.wrap_limit(), 80);

        let received = &app.world().resource::<Received>().0;
        assert!(received.contains(&SessionEvent::WrapModeChanged { enabled: true }));
    }

    #[test]
    fn test_changed_settings_reach_session() {
        let mut app = app_with(LayoutSettings::default());
        app.update();
        app.world_mut()
            .resource_mut::<LayoutSettings>()
            .indentation
            .tab_size = 2;
        app.update();

        assert_eq!(app.world().resource::<EditSession>().tab_size(), 2);
        let received = &app.world().resource::<Received>().0;
        assert!(received.contains(&SessionEvent::TabSizeChanged { tab_size: 2 }));
    }

    #[test]
    fn test_fold_events_are_forwarded() {
        let mut app = app_with(LayoutSettings::default());
        app.world_mut()
            .resource_mut::<EditSession>()
            .add_fold("...", Range::new(0, 8, 2, 0))
            .unwrap();
        app.update();

        let received = &app.world().resource::<Received>().0;
        assert_eq!(
            received,
            &vec![SessionEvent::fold_added(Range::new(0, 8, 2, 0), "...")]
        );
        assert!(app.world().resource::<EditSession>().is_row_folded(1));
    }
}
