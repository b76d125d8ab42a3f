use crate::scene::selection::{
    IOR_MAX, IOR_MIN, ModelKind, RefractionMethod, Selection, SkyboxKind,
};
use egui::{RichText, Ui};

/// Buttons pressed in the panel this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PanelActions {
    pub screenshot: bool,
    pub start_fps_test: bool,
}

/// Draws the settings panel, editing `selection` in place.
pub fn draw_panel(ui: &mut Ui, selection: &mut Selection, benchmark_frames: u32) -> PanelActions {
    let mut actions = PanelActions::default();

    ui.label(RichText::new("Refraction").size(16.0).strong());
    ui.separator();

    ui.add(egui::Slider::new(&mut selection.ior, IOR_MIN..=IOR_MAX).text("IOR"));
    ui.checkbox(&mut selection.dv_only, "d_V only")
        .on_hover_text("Two surfaces: use the screen-space thickness alone");
    ui.checkbox(&mut selection.spin, "Spin");
    ui.checkbox(&mut selection.reflect, "Reflect");

    ui.add_space(6.0);
    combo(ui, "model", "Model", &mut selection.model, &ModelKind::ALL, |m| m.label());
    combo(
        ui,
        "refraction",
        "Refraction",
        &mut selection.refraction,
        &RefractionMethod::ALL,
        |r| r.label(),
    );
    combo(ui, "skybox", "Skybox", &mut selection.skybox, &SkyboxKind::ALL, |s| s.label());

    ui.add_space(6.0);
    if ui
        .button("Start FPS Test")
        .on_hover_text(format!("Measure {} frames", benchmark_frames))
        .clicked()
    {
        actions.start_fps_test = true;
    }
    ui.checkbox(&mut selection.zoom_in, "Zoom In");
    if ui.button("Screenshot").clicked() {
        actions.screenshot = true;
    }

    ui.add_space(10.0);
    ui.separator();
    ui.small("W/A/S/D/Q/E - move");
    ui.small("I - toggle mouse look");
    ui.small("Scroll - zoom (when enabled)");
    ui.small("R - reset camera, Esc - quit");

    actions
}

fn combo<T: Copy + PartialEq>(
    ui: &mut Ui,
    id: &str,
    label: &str,
    value: &mut T,
    options: &[T],
    name: impl Fn(T) -> &'static str,
) {
    ui.horizontal(|ui| {
        ui.label(label);
        egui::ComboBox::from_id_salt(id)
            .selected_text(name(*value))
            .show_ui(ui, |ui| {
                for &option in options {
                    ui.selectable_value(value, option, name(option));
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_frame_changes_nothing() {
        let ctx = egui::Context::default();
        let mut selection = Selection::default();
        let mut actions = None;
        let _ = ctx.run(egui::RawInput::default(), |ctx| {
            egui::CentralPanel::default().show(ctx, |ui| {
                actions = Some(draw_panel(ui, &mut selection, 1000));
            });
        });
        assert_eq!(actions, Some(PanelActions::default()));
        assert_eq!(selection, Selection::default());
    }
}
