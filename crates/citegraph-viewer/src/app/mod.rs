use bevy::app::AppExit;
use bevy::prelude::*;
use citegraph_resolver::ResolverHandle;

use crate::app::resources::ResolverLink;
use crate::graph::ViewState;

pub mod resources;

pub struct CiteGraphViewerPlugin;

impl Plugin for CiteGraphViewerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(Color::WHITE))
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    pump_resolver,
                    crate::ui::handle_shortcuts,
                    crate::ui::ui_panel,
                    apply_rebuild,
                    crate::render::graph_canvas,
                    apply_close,
                )
                    .chain(),
            );
    }
}

fn setup_camera(mut commands: Commands) {
    commands.spawn(Camera2dBundle::default());
}

fn pump_resolver(mut st: ResMut<ViewState>, link: Option<Res<ResolverLink>>) {
    let Some(link) = link else {
        return;
    };
    for outcome in link.0.try_outcomes() {
        st.apply_outcome(outcome);
    }
}

fn apply_rebuild(mut st: ResMut<ViewState>, link: Option<Res<ResolverLink>>) {
    if !st.ui.rebuild_requested {
        return;
    }
    st.ui.rebuild_requested = false;
    dispatch_rebuild(&mut st, link.as_deref().map(|link| &link.0));
}

/// An online citation build goes to the resolver; any other rebuild still
/// supersedes the batch the resolver may be working on.
fn dispatch_rebuild(st: &mut ViewState, link: Option<&ResolverHandle>) {
    let Some(request) = st.rebuild() else {
        if let Some(link) = link {
            link.invalidate(st.session.generation());
        }
        return;
    };
    let submitted = link.is_some_and(|link| link.submit(request));
    if !submitted {
        warn!("citation resolver unavailable; showing graph without lookups");
        st.ui.use_external = false;
        st.ui.rebuild_requested = true;
    }
}

fn apply_close(
    mut st: ResMut<ViewState>,
    link: Option<Res<ResolverLink>>,
    mut exit: EventWriter<AppExit>,
) {
    if !st.ui.close_requested || st.session.is_closed() {
        return;
    }
    let current = st.close();
    if let Some(link) = link {
        link.0.invalidate(current);
    }
    info!("graph view closed");
    exit.send(AppExit::Success);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::config::ViewerConfig;
    use citegraph_core::{AuthorRef, GraphKind, Hops, PaperRecord};
    use citegraph_resolver::{spawn_resolver, CitationResolver, HttpWorkSource};
    use std::time::Duration;

    fn paper(id: u64, doi: &str) -> PaperRecord {
        PaperRecord {
            id,
            title: None,
            year: None,
            authors: Some(vec![AuthorRef {
                name: Some("A".to_string()),
            }]),
            doi: Some(doi.to_string()),
        }
    }

    #[test]
    fn offline_rebuild_retires_running_batch() {
        let source = HttpWorkSource::new(Duration::from_millis(200)).expect("client");
        let resolver = CitationResolver::new(source, "http://127.0.0.1:9").expect("resolver");
        let handle = spawn_resolver(resolver, 1).expect("resolver thread");
        let mut st = ViewState::new(
            GraphKind::Citation,
            vec![paper(1, "10.1/a"), paper(2, "10.1/b")],
            ViewerConfig::default(),
            None,
            Hops::One,
            true,
        );

        dispatch_rebuild(&mut st, Some(&handle));
        assert!(st.ui.loading);
        let submitted = handle.current();

        st.ui.use_external = false;
        dispatch_rebuild(&mut st, Some(&handle));
        assert!(!st.ui.loading);
        assert!(handle.current() > submitted);
        assert_eq!(handle.current(), st.session.generation());
        assert!(handle.try_outcomes().is_empty());
    }

    #[test]
    fn missing_resolver_falls_back_to_offline() {
        let mut st = ViewState::new(
            GraphKind::Citation,
            vec![paper(1, "10.1/a")],
            ViewerConfig::default(),
            None,
            Hops::One,
            true,
        );
        dispatch_rebuild(&mut st, None);
        assert!(!st.ui.use_external);
        assert!(st.ui.rebuild_requested);
    }
}
