//! Bevy test app builders.

use bevy::app::Plugins;
use bevy::prelude::*;

/// Create a minimal test app with only the core plugin.
///
/// Provides `FbikSet` system ordering and default `Settings`. Solver
/// plugins are added by the test.
pub fn minimal_test_app() -> App {
    let mut app = App::new();
    app.add_plugins(fbik_core::FbikCorePlugin);
    app.finish();
    app.cleanup();
    app
}

/// Create a test app with the core plugin plus the given solver plugins.
///
/// Plugins cannot be added once the app is finished, so solver tests
/// build through here rather than extending [`minimal_test_app`].
pub fn test_app_with<M>(plugins: impl Plugins<M>) -> App {
    let mut app = App::new();
    app.add_plugins(fbik_core::FbikCorePlugin);
    app.add_plugins(plugins);
    app.finish();
    app.cleanup();
    app
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_app_builds() {
        let app = minimal_test_app();
        assert!(
            app.world()
                .get_resource::<fbik_core::config::Settings>()
                .is_some()
        );
    }

    #[test]
    fn minimal_app_can_update() {
        let mut app = minimal_test_app();
        app.update();
        app.update();
    }

    #[derive(Resource)]
    struct Marker;

    struct MarkerPlugin;

    impl Plugin for MarkerPlugin {
        fn build(&self, app: &mut App) {
            app.insert_resource(Marker);
        }
    }

    #[test]
    fn app_with_extra_plugin_builds() {
        let mut app = test_app_with(MarkerPlugin);
        app.update();
        assert!(app.world().get_resource::<Marker>().is_some());
        assert!(
            app.world()
                .get_resource::<fbik_core::config::Settings>()
                .is_some()
        );
    }
}
