// src/session.rs
//! All tools attached to one map, driven through a single event handler

use crate::{
    basemaps::{get_basemap, BasemapSwitcher},
    config::ToolsConfig,
    error::{Result, ToolError},
    grid::{GridKind, GridTool},
    host::{HeadlessMap, MapHost, Viewport},
    recording::{Player, Recorder, Recording},
    style::{StyleChange, StyleEditor, StyleTextEditor},
};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Identifies a style editor within a session.
pub type EditorId = usize;

/// Everything a user can do to the tools of a map, one variant per control.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolEvent {
    /// The host reported a pan or zoom.
    ViewportChanged(Viewport),
    GridLevel { grid: GridKind, level: u8 },
    GridHover { grid: GridKind, id: String },
    CloseGrid(GridKind),
    BasemapSelected(String),
    CloseBasemap,
    Style { editor: EditorId, change: StyleChange },
    StyleText { editor: EditorId, text: String },
    CloseStyle(EditorId),
    ToggleRecording,
}

enum Editor {
    Controls(StyleEditor),
    Text(StyleTextEditor),
}

/// Owns a map host and every tool placed on it.
pub struct MapSession<H: MapHost> {
    host: H,
    config: ToolsConfig,
    grids: Vec<GridTool>,
    /// The basemap switcher currently shown, if any. Set on creation,
    /// cleared on close.
    basemap_control: Option<BasemapSwitcher>,
    editors: BTreeMap<EditorId, Editor>,
    next_editor: EditorId,
    recorder: Recorder,
}

impl<H: MapHost> MapSession<H> {
    pub fn new(host: H, config: ToolsConfig) -> Self {
        Self {
            host,
            config,
            grids: Vec::new(),
            basemap_control: None,
            editors: BTreeMap::new(),
            next_editor: 0,
            recorder: Recorder::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    /// Place a grid overlay of `kind`, replacing an existing one.
    pub fn add_grid(&mut self, kind: GridKind) -> Result<&GridTool> {
        self.close_grid(kind);
        let tool = GridTool::new(
            &mut self.host,
            kind,
            self.config.policy(kind),
            self.config.h3_containment,
        )?;
        info!(grid = %kind, level = tool.level(), "grid tool added");
        self.host
            .set_layer_style(&tool.description, "style", self.config.grid_style.clone());
        self.host
            .set_layer_style(&tool.description, "hover_style", self.config.grid_hover_style.clone());
        self.grids.push(tool);
        self.grid(kind).ok_or_else(|| ToolError::Other(format!("{} grid vanished", kind)))
    }

    pub fn grid(&self, kind: GridKind) -> Option<&GridTool> {
        self.grids.iter().find(|g| g.kind == kind)
    }

    /// Show the basemap switcher, closing a previous one first.
    pub fn add_basemap_switcher(&mut self, description: &str) -> Result<&BasemapSwitcher> {
        if let Some(previous) = self.basemap_control.take() {
            previous.close(&mut self.host);
        }
        if self.host.base_layer().is_none() {
            if let Some(basemap) = get_basemap(&self.config.default_basemap) {
                self.host.set_base_layer(&basemap);
            }
        }
        let switcher = BasemapSwitcher::new(&mut self.host, description)?;
        Ok(self.basemap_control.insert(switcher))
    }

    pub fn basemap_control(&self) -> Option<&BasemapSwitcher> {
        self.basemap_control.as_ref()
    }

    pub fn add_style_editor(
        &mut self,
        layer: &str,
        attr_name: &str,
        kind: &str,
        orientation: &str,
    ) -> Result<EditorId> {
        let editor = StyleEditor::new(&self.host, layer, attr_name, kind, orientation)?;
        Ok(self.insert_editor(Editor::Controls(editor)))
    }

    pub fn add_style_text_editor(&mut self, layer: &str, attr_name: &str) -> Result<EditorId> {
        let editor = StyleTextEditor::new(&self.host, layer, attr_name)?;
        Ok(self.insert_editor(Editor::Text(editor)))
    }

    pub fn style_editor(&self, id: EditorId) -> Option<&StyleEditor> {
        match self.editors.get(&id) {
            Some(Editor::Controls(editor)) => Some(editor),
            _ => None,
        }
    }

    pub fn style_text_editor(&self, id: EditorId) -> Option<&StyleTextEditor> {
        match self.editors.get(&id) {
            Some(Editor::Text(editor)) => Some(editor),
            _ => None,
        }
    }

    fn insert_editor(&mut self, editor: Editor) -> EditorId {
        let id = self.next_editor;
        self.next_editor += 1;
        self.host.add_control(&format!("style:{}", id));
        self.editors.insert(id, editor);
        id
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    /// Replace the recorder's content with a recording loaded from `path`.
    pub fn load_recording(&mut self, path: &Path) -> Result<()> {
        if self.recorder.is_recording() {
            return Err(ToolError::InvalidArgument("cannot load while recording".to_string()));
        }
        self.recorder = Recorder::with_recording(Recording::load(path)?);
        Ok(())
    }

    pub fn save_recording(&self, path: &Path) -> Result<()> {
        if !self.recorder.can_save() {
            return Err(ToolError::InvalidArgument("nothing to save".to_string()));
        }
        self.recorder.recording().save(path)
    }

    /// Play the current recording back onto the map.
    pub async fn play_recording(&mut self, player: &Player) -> Result<usize> {
        if !self.recorder.can_play() {
            return Err(ToolError::InvalidArgument("nothing to play".to_string()));
        }
        let recording = self.recorder.recording().clone();
        Ok(player.play(&recording, &mut self.host).await)
    }

    /// Single entry point for all tool events.
    pub fn dispatch(&mut self, event: ToolEvent) -> Result<()> {
        debug!(?event, "dispatching tool event");
        match event {
            ToolEvent::ViewportChanged(viewport) => {
                // Every listener sees the change; the first failure is reported after.
                self.recorder.on_viewport_changed(&viewport);
                let mut first_error = None;
                for grid in &mut self.grids {
                    if let Err(e) = grid.viewport_changed(&mut self.host, &viewport) {
                        warn!(grid = %grid.kind, error = %e, "grid update failed");
                        first_error.get_or_insert(e);
                    }
                }
                first_error.map_or(Ok(()), Err)
            }
            ToolEvent::GridLevel { grid, level } => {
                find_grid(&mut self.grids, grid)?.set_level(&mut self.host, level)
            }
            ToolEvent::GridHover { grid, id } => find_grid(&mut self.grids, grid)?.hover(&id),
            ToolEvent::CloseGrid(kind) => {
                self.close_grid(kind);
                Ok(())
            }
            ToolEvent::BasemapSelected(name) => match self.basemap_control.as_mut() {
                Some(switcher) => switcher.select(&mut self.host, &name),
                None => Err(ToolError::InvalidArgument("no basemap switcher shown".to_string())),
            },
            ToolEvent::CloseBasemap => {
                if let Some(switcher) = self.basemap_control.take() {
                    switcher.close(&mut self.host);
                }
                Ok(())
            }
            ToolEvent::Style { editor, change } => match self.editors.get_mut(&editor) {
                Some(Editor::Controls(editor)) => {
                    editor.apply(&mut self.host, change);
                    Ok(())
                }
                _ => Err(unknown_editor(editor)),
            },
            ToolEvent::StyleText { editor, text } => match self.editors.get_mut(&editor) {
                Some(Editor::Text(editor)) => {
                    editor.text_changed(&mut self.host, &text);
                    Ok(())
                }
                _ => Err(unknown_editor(editor)),
            },
            ToolEvent::CloseStyle(id) => {
                if self.editors.remove(&id).is_some() {
                    self.host.remove_control(&format!("style:{}", id));
                }
                Ok(())
            }
            ToolEvent::ToggleRecording => {
                self.recorder.toggle(&mut self.host);
                Ok(())
            }
        }
    }

    fn close_grid(&mut self, kind: GridKind) {
        if let Some(pos) = self.grids.iter().position(|g| g.kind == kind) {
            let tool = self.grids.remove(pos);
            tool.close(&mut self.host);
            info!(grid = %kind, "grid tool closed");
        }
    }
}

impl MapSession<HeadlessMap> {
    /// Dispatch every viewport notification the headless map has queued.
    pub fn pump(&mut self) -> Result<usize> {
        let notifications = self.host.take_notifications();
        let count = notifications.len();
        for viewport in notifications {
            self.dispatch(ToolEvent::ViewportChanged(viewport))?;
        }
        Ok(count)
    }
}

fn find_grid(grids: &mut [GridTool], kind: GridKind) -> Result<&mut GridTool> {
    grids
        .iter_mut()
        .find(|g| g.kind == kind)
        .ok_or_else(|| ToolError::InvalidArgument(format!("no {} grid on the map", kind)))
}

fn unknown_editor(id: EditorId) -> ToolError {
    ToolError::InvalidArgument(format!("no style editor {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn session() -> MapSession<HeadlessMap> {
        let map = HeadlessMap::new((48.14, 11.58), 6.0, (640, 480));
        MapSession::new(map, ToolsConfig::default())
    }

    #[test]
    fn test_viewport_change_regenerates_all_grids() {
        let mut session = session();
        session.add_grid(GridKind::Mercator).unwrap();
        session.add_grid(GridKind::H3).unwrap();
        assert_eq!(session.grid(GridKind::H3).unwrap().level(), 5);
        assert_eq!(
            session.host().layer_style("Mercator", "style"),
            Some(session.config().grid_style.clone())
        );

        session.host_mut().set_zoom(8.0);
        session.host_mut().set_center((48.2, 11.6));
        assert_eq!(session.pump().unwrap(), 2);

        let zoomed = session.host().viewport();
        let mercator = session.grid(GridKind::Mercator).unwrap();
        assert_eq!(mercator.status(), " Map zoom: 8");
        assert_eq!(
            session.host().overlay("Mercator"),
            Some(mercator.features())
        );
        let expected = crate::grid::mercator::grid(
            &zoomed.bounds,
            mercator.level(),
            8.0,
            &session.config().policy(GridKind::Mercator),
        )
        .unwrap();
        assert_eq!(mercator.features(), &expected);
    }

    #[test]
    fn test_failing_grid_does_not_starve_other_listeners() {
        let mut session = session();
        session.add_grid(GridKind::H3).unwrap();
        session.add_grid(GridKind::Mercator).unwrap();
        session.dispatch(ToolEvent::ToggleRecording).unwrap();
        let recorded = session.recorder().recording().len();

        let mut viewport = session.host().viewport();
        viewport.zoom = 8.0;
        viewport.bounds.south = f64::NAN;
        let result = session.dispatch(ToolEvent::ViewportChanged(viewport));

        assert!(matches!(result, Err(ToolError::InvalidBounds(_))));
        assert_eq!(session.recorder().recording().len(), recorded + 1);
        assert_eq!(session.grid(GridKind::Mercator).unwrap().status(), " Map zoom: 8");
    }

    #[test]
    fn test_grid_events_route_by_kind() {
        let mut session = session();
        session.add_grid(GridKind::Mercator).unwrap();
        session
            .dispatch(ToolEvent::GridLevel { grid: GridKind::Mercator, level: 8 })
            .unwrap();
        assert_eq!(session.grid(GridKind::Mercator).unwrap().level(), 8);

        let err = session.dispatch(ToolEvent::GridLevel { grid: GridKind::H3, level: 2 });
        assert!(err.is_err());
        let err = session.dispatch(ToolEvent::GridLevel { grid: GridKind::Mercator, level: 11 });
        assert!(matches!(err, Err(ToolError::LevelOutOfRange { level: 11, max: 10 })));

        session.dispatch(ToolEvent::CloseGrid(GridKind::Mercator)).unwrap();
        assert!(session.grid(GridKind::Mercator).is_none());
        assert!(session.host().overlay("Mercator").is_none());
    }

    #[test]
    fn test_basemap_control_lifecycle() {
        let mut session = session();
        assert!(session
            .dispatch(ToolEvent::BasemapSelected("CartoDB.Positron".to_string()))
            .is_err());

        session.add_basemap_switcher("Basemap").unwrap();
        assert_eq!(session.host().base_layer().as_deref(), Some("OpenStreetMap.Mapnik"));
        session
            .dispatch(ToolEvent::BasemapSelected("CartoDB.Positron".to_string()))
            .unwrap();
        assert_eq!(session.host().base_layer().as_deref(), Some("CartoDB.Positron"));
        assert_eq!(session.basemap_control().unwrap().value, "CartoDB.Positron");

        session.dispatch(ToolEvent::CloseBasemap).unwrap();
        assert!(session.basemap_control().is_none());
        assert!(!session.host().controls().iter().any(|c| c == "basemap"));
        // The base layer itself stays.
        assert_eq!(session.host().base_layer().as_deref(), Some("CartoDB.Positron"));
    }

    #[test]
    fn test_style_events() {
        let mut session = session();
        session.host_mut().set_layer_style(
            "roads",
            "style",
            json!({"color": "#ff0000"}).as_object().cloned().unwrap(),
        );
        let controls = session.add_style_editor("roads", "style", "stroke", "horizontal").unwrap();
        let text = session.add_style_text_editor("roads", "style").unwrap();
        assert!(session.add_style_editor("roads", "style", "glow", "horizontal").is_err());

        session
            .dispatch(ToolEvent::Style { editor: controls, change: StyleChange::Weight(7) })
            .unwrap();
        assert_eq!(session.host().layer_style("roads", "style").unwrap()["weight"], json!(7));
        assert_eq!(session.style_editor(controls).unwrap().weight, 7);

        session
            .dispatch(ToolEvent::StyleText { editor: text, text: "{\"color\": ".to_string() })
            .unwrap();
        assert_eq!(session.host().layer_style("roads", "style").unwrap()["weight"], json!(7));
        assert_eq!(session.style_text_editor(text).unwrap().text, "{\"color\": ");

        assert!(session
            .dispatch(ToolEvent::StyleText { editor: controls, text: "{}".to_string() })
            .is_err());

        session.dispatch(ToolEvent::CloseStyle(controls)).unwrap();
        assert!(session.style_editor(controls).is_none());
        assert_eq!(session.host().controls(), &[format!("style:{}", text)]);
    }

    #[test]
    fn test_recording_through_events() {
        let mut session = session();
        assert!(!session.recorder().can_play());
        session.dispatch(ToolEvent::ToggleRecording).unwrap();
        session.host_mut().set_zoom(7.0);
        session.pump().unwrap();
        session.dispatch(ToolEvent::ToggleRecording).unwrap();

        let events = session.recorder().recording().events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].zoom, 7.0);
        assert!(session.recorder().can_play());

        // No more notifications once recording stopped and no grid listens.
        session.host_mut().set_zoom(9.0);
        assert_eq!(session.pump().unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_recording_requires_content() {
        let mut session = session();
        let player = Player::new();
        assert!(session.play_recording(&player).await.is_err());

        session.dispatch(ToolEvent::ToggleRecording).unwrap();
        session.host_mut().set_center((50.0, 10.0));
        session.pump().unwrap();
        session.dispatch(ToolEvent::ToggleRecording).unwrap();

        session.host_mut().set_center((0.0, 0.0));
        assert_eq!(session.play_recording(&player).await.unwrap(), 2);
        assert_eq!(session.host().viewport().center, (50.0, 10.0));
    }
}
