use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use cardcut_config::AppConfig;
use cardcut_core::cut::CutEntity;
use cardcut_core::geometry::Point2;
use cardcut_core::layout::LayoutResult;
use cardcut_engine::service::{LayoutRequest, LayoutService};
use cardcut_io::{DocumentLoader, DxfFacade};
use tracing::info;

use crate::errors::FrontendError;
use crate::loader::load_decklist;

/// `layout` 子命令的参数；未指定的项取自配置文件。
#[derive(Debug, Clone, Default)]
pub struct LayoutArgs {
    pub decklist: PathBuf,
    pub machine: Option<String>,
    pub paper: Option<String>,
    pub card_type: Option<String>,
    /// `None` 时取配置中的 `sensor_safe`。
    pub sensor_safe: Option<bool>,
    pub output: Option<PathBuf>,
}

#[derive(Debug)]
pub struct LayoutOutcome {
    pub layout: LayoutResult,
    pub cut_file: PathBuf,
    pub layout_file: PathBuf,
}

/// 计算排版并写出 `<stem>.<ext>` 切割文件与 `<stem>.layout.json`。
pub fn run_layout(
    config: &AppConfig,
    args: &LayoutArgs,
    out: &mut impl Write,
) -> Result<LayoutOutcome, FrontendError> {
    let decklist = load_decklist(&args.decklist)?;
    let machine_id = args.machine.as_deref().unwrap_or(&config.layout.machine);
    let paper = args.paper.as_deref().unwrap_or(&config.layout.paper_size);
    let card_type = args.card_type.as_deref().or(config.layout.card_type.as_deref());
    let sensor_safe = args.sensor_safe.unwrap_or(config.layout.sensor_safe);

    let service = LayoutService::with_defaults();
    let layout = service.calculate_layout(&LayoutRequest {
        machine_id,
        decklist: &decklist,
        paper,
        sensor_safe,
        card_type,
    })?;
    let cut_file = service.generate_cut_file(machine_id, &layout)?;

    let output_dir = args
        .output
        .clone()
        .unwrap_or_else(|| config.output.directory.clone());
    fs::create_dir_all(&output_dir).map_err(|source| FrontendError::Write {
        path: output_dir.clone(),
        source,
    })?;

    let stem = args
        .decklist
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "layout".to_string());
    let cut_path = output_dir.join(format!("{stem}.{}", cut_file.extension));
    let layout_path = output_dir.join(format!("{stem}.layout.json"));

    write_file(&cut_path, &cut_file.bytes)?;
    let json = serde_json::to_string_pretty(&layout).map_err(FrontendError::Serialize)?;
    write_file(&layout_path, json.as_bytes())?;

    info!(
        machine = machine_id,
        paper,
        pages = layout.pages.len(),
        cut_file = %cut_path.display(),
        "已写出排版结果"
    );

    writeln!(
        out,
        "设备={machine_id}, 纸张={paper}, 卡型={}, 共 {} 张卡，{} 页",
        layout.card_type,
        layout.total_cards,
        layout.pages.len()
    )?;
    for page in &layout.pages {
        writeln!(out, "  - 第 {} 页: {} 张", page.page_number, page.items.len())?;
    }
    writeln!(out, "切割文件: {}", cut_path.display())?;
    writeln!(out, "排版数据: {}", layout_path.display())?;

    Ok(LayoutOutcome {
        layout,
        cut_file: cut_path,
        layout_file: layout_path,
    })
}

/// 列出已注册的切割设备（按 id 排序），以及可用的游戏、纸张与卡型。
pub fn list_machines(out: &mut impl Write) -> Result<(), FrontendError> {
    let service = LayoutService::with_defaults();
    writeln!(out, "支持的设备：")?;
    for machine in service.machines().machines() {
        writeln!(
            out,
            "  - {} ({}), 出血={}mm, 定位标记={}, 切割文件=.{}",
            machine.id(),
            machine.name(),
            machine.bleed_mm(),
            if machine.supports_registration_marks() { "是" } else { "否" },
            machine.cut_file_extension()
        )?;
    }

    writeln!(out, "支持的游戏：")?;
    for game in service.games().games() {
        writeln!(
            out,
            "  - {} ({}), 默认卡型={}",
            game.id, game.name, game.default_card_type
        )?;
    }

    let catalog = service.catalog();
    let papers: Vec<&str> = catalog.paper_keys().collect();
    writeln!(out, "纸张：{}", papers.join(", "))?;
    let card_types: Vec<&str> = catalog.card_type_keys().collect();
    writeln!(out, "卡型：{}", card_types.join(", "))?;
    Ok(())
}

/// 打印 DXF 切割文件的图层、轮廓与包围盒。
pub fn run_inspect(path: &Path, out: &mut impl Write) -> Result<(), FrontendError> {
    let document = DxfFacade::new().load(path)?;
    info!(path = %path.display(), entities = document.entities().count(), "已读取切割文件");

    writeln!(out, "切割文件：{}", path.display())?;
    let layers: Vec<&str> = document.layers().map(|layer| layer.name.as_str()).collect();
    writeln!(out, "图层：{}", layers.join(", "))?;

    for (id, entity) in document.entities() {
        match entity {
            CutEntity::Polyline(polyline) => {
                writeln!(
                    out,
                    "  - 多段线 #{}, Layer={}, 顶点数={}, 闭合={}, 圆弧数={}",
                    id.get(),
                    polyline.layer,
                    polyline.vertices.len(),
                    if polyline.is_closed { "是" } else { "否" },
                    polyline.arc_count()
                )?;
            }
            CutEntity::Line(line) => {
                writeln!(
                    out,
                    "  - 线段 #{}, Layer={}, 起点={}, 终点={}",
                    id.get(),
                    line.layer,
                    format_point(line.start),
                    format_point(line.end)
                )?;
            }
        }
    }

    match document.bounds() {
        Some(bounds) => writeln!(
            out,
            "包围盒：{} - {}，尺寸 {:.2} x {:.2} mm",
            format_point(bounds.min()),
            format_point(bounds.max()),
            bounds.width(),
            bounds.height()
        )?,
        None => writeln!(out, "包围盒：<无>")?,
    }
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), FrontendError> {
    fs::write(path, bytes).map_err(|source| FrontendError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn format_point(point: Point2) -> String {
    format!("({:.2}, {:.2})", point.x(), point.y())
}
