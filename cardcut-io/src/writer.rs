use std::fmt::Display;

use cardcut_core::cut::{CutDocument, CutEntity, Line, Polyline};

/// 坐标固定保留的小数位数，切割软件按此精度读入。
pub const COORDINATE_PRECISION: usize = 4;

/// 最小 DXF 写出器：空 HEADER 段 + ENTITIES 段 + EOF。
#[derive(Debug, Clone, Copy)]
pub struct DxfWriter {
    precision: usize,
}

impl DxfWriter {
    pub fn new() -> Self {
        Self {
            precision: COORDINATE_PRECISION,
        }
    }

    pub fn write_string(&self, document: &CutDocument) -> String {
        let mut out = String::new();
        push_pair(&mut out, 0, "SECTION");
        push_pair(&mut out, 2, "HEADER");
        push_pair(&mut out, 0, "ENDSEC");
        push_pair(&mut out, 0, "SECTION");
        push_pair(&mut out, 2, "ENTITIES");
        for (_, entity) in document.entities() {
            match entity {
                CutEntity::Polyline(polyline) => self.write_lwpolyline(&mut out, polyline),
                CutEntity::Line(line) => self.write_line(&mut out, line),
            }
        }
        push_pair(&mut out, 0, "ENDSEC");
        push_pair(&mut out, 0, "EOF");
        out
    }

    fn write_lwpolyline(&self, out: &mut String, polyline: &Polyline) {
        push_pair(out, 0, "LWPOLYLINE");
        push_pair(out, 8, &polyline.layer);
        push_pair(out, 90, polyline.vertices.len());
        push_pair(out, 70, if polyline.is_closed { 1 } else { 0 });
        for vertex in &polyline.vertices {
            push_pair(out, 10, self.coord(vertex.position.x()));
            push_pair(out, 20, self.coord(vertex.position.y()));
            // bulge 按最短往返格式写出，-0.41421356 原样保留
            if vertex.bulge != 0.0 {
                push_pair(out, 42, vertex.bulge);
            }
        }
    }

    fn write_line(&self, out: &mut String, line: &Line) {
        push_pair(out, 0, "LINE");
        push_pair(out, 8, &line.layer);
        push_pair(out, 10, self.coord(line.start.x()));
        push_pair(out, 20, self.coord(line.start.y()));
        push_pair(out, 11, self.coord(line.end.x()));
        push_pair(out, 21, self.coord(line.end.y()));
    }

    #[inline]
    fn coord(&self, value: f64) -> String {
        format!("{value:.prec$}", prec = self.precision)
    }
}

impl Default for DxfWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn push_pair(out: &mut String, code: i32, value: impl Display) {
    out.push_str(&format!("{code}\n{value}\n"));
}
