use std::path::Path;

use eframe::egui::{Color32, ComboBox, RichText, Slider};
use rfd::FileDialog;

use liblegend_dashboard::config::Config;
use liblegend_dashboard::figure::Figure;
use liblegend_dashboard::monitor::PhyMonitor;
use liblegend_dashboard::selection::Selection;
use liblegend_dashboard::view::{
    build_phy_section, Page, Widget, WidgetId, WidgetKind, DEFAULT_WIDGET_WIDTH,
    GENERAL_INFORMATION,
};

use super::plot::render_figure;

fn render_error_dialog(show: &mut bool, ctx: &eframe::egui::Context) {
    eframe::egui::Window::new("Error")
        .open(show)
        .show(ctx, |ui| {
            ui.label(
                "There was an error! Check the log file legend_dashboard.log for more information.",
            )
        });
}

/// Draw one selector, returning the newly chosen value if the user changed it
fn render_widget(ui: &mut eframe::egui::Ui, widget: &Widget) -> Option<String> {
    let width = widget.width as f32;
    let mut chosen = None;
    match &widget.kind {
        WidgetKind::Select => {
            ComboBox::from_label(&widget.label)
                .width(width)
                .selected_text(&widget.selected)
                .show_ui(ui, |ui| {
                    for option in widget.options.iter() {
                        if ui
                            .selectable_label(*option == widget.selected, option)
                            .clicked()
                        {
                            chosen = Some(option.clone());
                        }
                    }
                });
        }
        WidgetKind::RadioButtons { vertical } => {
            let mut draw = |ui: &mut eframe::egui::Ui| {
                for option in widget.options.iter() {
                    if ui.radio(*option == widget.selected, option).clicked() {
                        chosen = Some(option.clone());
                    }
                }
            };
            ui.label(&widget.label);
            if *vertical {
                ui.vertical(draw);
            } else {
                ui.horizontal(|ui| draw(ui));
            }
        }
        WidgetKind::MenuButton => {
            ui.horizontal(|ui| {
                ui.menu_button(&widget.label, |ui| {
                    ui.set_min_width(width);
                    for option in widget.options.iter() {
                        if ui.button(option).clicked() {
                            chosen = Some(option.clone());
                            ui.close_menu();
                        }
                    }
                });
                ui.label(RichText::new(&widget.selected).color(Color32::LIGHT_BLUE));
            });
        }
        WidgetKind::Slider { min, max, suffix } => {
            let mut value: u32 = widget.selected.parse().unwrap_or(*min);
            ui.label(&widget.label);
            let response = ui.add(Slider::new(&mut value, *min..=*max).suffix(format!(" {suffix}")));
            // Only act once the user lets go of the slider
            if response.drag_stopped() || (response.changed() && !response.dragged()) {
                chosen = Some(value.to_string());
            }
        }
    }
    chosen
}

/// The UI app which inherits the eframe::App trait.
///
/// Owns the session state; every selector change produces a new Selection snapshot and the
/// figure is recomputed when it no longer matches the shown one.
pub struct DashboardApp {
    monitor: Option<PhyMonitor>,
    selection: Option<Selection>,
    shown: Option<(Selection, Figure)>,
    page: Page,
    widget_width: u32,
    show_error_window: bool,
}

impl DashboardApp {
    /// Create the application, optionally loading a config right away
    pub fn new(cc: &eframe::CreationContext<'_>, config_path: Option<&Path>) -> Self {
        let mut visuals = eframe::egui::Visuals::dark();
        visuals.override_text_color = Some(Color32::LIGHT_GRAY);
        cc.egui_ctx.set_visuals(visuals);
        let mut app = DashboardApp {
            monitor: None,
            selection: None,
            shown: None,
            page: Page::PhyMonitoring,
            widget_width: DEFAULT_WIDGET_WIDTH,
            show_error_window: false,
        };
        if let Some(path) = config_path {
            app.read_config(path);
        }
        app
    }

    /// Read the Config from a file and start a new session from it
    fn read_config(&mut self, path: &Path) {
        let monitor = Config::read_config_file(path)
            .map_err(|e| e.to_string())
            .and_then(|conf| PhyMonitor::new(conf).map_err(|e| e.to_string()));
        match monitor {
            Ok(monitor) => {
                spdlog::info!("Loaded configuration {}", path.display());
                self.selection = Some(monitor.initial_selection());
                self.monitor = Some(monitor);
                self.shown = None;
            }
            Err(e) => {
                self.show_error_window = true;
                spdlog::error!("{}", e)
            }
        }
    }

    /// Re-render if the selection changed since the shown figure was built.
    /// Returns true when a new figure was produced
    fn refresh(&mut self) -> bool {
        let (Some(monitor), Some(selection)) = (&self.monitor, &self.selection) else {
            return false;
        };
        if matches!(&self.shown, Some((shown, _)) if shown == selection) {
            return false;
        }
        let figure = monitor.render(selection);
        self.shown = Some((selection.clone(), figure));
        true
    }

    fn render_phy_page(&mut self, ui: &mut eframe::egui::Ui) {
        let reset = self.refresh();
        let (Some(monitor), Some(selection), Some((_, figure))) =
            (&self.monitor, &self.selection, &self.shown)
        else {
            ui.label("Open a configuration file using File->Open");
            return;
        };

        let section = build_phy_section(monitor, selection, figure.clone(), self.widget_width);
        let mut changes: Vec<(WidgetId, String)> = vec![];
        eframe::egui::Grid::new("SelectorGrid").show(ui, |ui| {
            for (idx, widget) in section.widgets.iter().enumerate() {
                if let Some(value) = render_widget(ui, widget) {
                    changes.push((widget.id, value));
                }
                if idx % 4 == 3 {
                    ui.end_row();
                }
            }
        });
        ui.separator();
        ui.label(RichText::new(section.current_plot.trim_start_matches("## ")).size(18.0));
        render_figure(ui, &section.figure, reset);

        let mut next = selection.clone();
        for (id, value) in changes {
            match id.event(&value) {
                Some(event) => next = monitor.apply(&next, event),
                None => spdlog::warn!("Could not interpret {} for {}", value, id.key()),
            }
        }
        self.selection = Some(next);
    }
}

fn render_information(ui: &mut eframe::egui::Ui) {
    eframe::egui::ScrollArea::vertical().show(ui, |ui| {
        for line in GENERAL_INFORMATION.lines() {
            if let Some(heading) = line.strip_prefix("## ") {
                ui.label(RichText::new(heading).color(Color32::LIGHT_BLUE).size(18.0));
            } else if let Some(heading) = line.strip_prefix("# ") {
                ui.label(RichText::new(heading).color(Color32::LIGHT_BLUE).size(22.0));
            } else {
                ui.label(line.replace("**", ""));
            }
        }
    });
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &eframe::egui::Context, _frame: &mut eframe::Frame) {
        render_error_dialog(&mut self.show_error_window, ctx);
        eframe::egui::CentralPanel::default().show(ctx, |ui| {
            //Menus
            ui.horizontal(|ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open...").clicked() {
                        let mut dialog = FileDialog::new().add_filter("YAML file", &["yaml", "yml"]);
                        if let Ok(dir) = std::env::current_dir() {
                            dialog = dialog.set_directory(dir);
                        }
                        if let Some(path) = dialog.pick_file() {
                            self.read_config(&path);
                        }
                        ui.close_menu();
                    }
                });
                ui.separator();
                for page in Page::ALL {
                    ui.selectable_value(&mut self.page, page, page.title());
                }
                ui.separator();
                ui.label("Widget width");
                ui.add(eframe::egui::DragValue::new(&mut self.widget_width).range(60..=400));
            });
            ui.separator();

            match self.page {
                Page::PhyMonitoring => self.render_phy_page(ui),
                Page::Information => render_information(ui),
            }
        });
    }
}
