use std::fmt::Display;
use std::iter::Enumerate;
use std::str::Lines;

use cardcut_core::cut::{CutDocument, CutEntity, Line, Polyline, PolylineVertex};
use cardcut_core::geometry::Point2;

use crate::IoError;

/// 读回切割文件：只解析 ENTITIES 段中的 LWPOLYLINE 与 LINE，其他段和实体跳过。
pub(crate) fn read_cut_document(source: &str) -> Result<CutDocument, IoError> {
    let mut groups = Groups::new(source);
    let mut document = CutDocument::new();
    while let Some(group) = groups.next_group()? {
        if group.is_marker("EOF") {
            break;
        }
        if !group.is_marker("SECTION") {
            return Err(malformed(
                group.line,
                format!("期望 SECTION 或 EOF，读到组码 {} \"{}\"", group.code, group.value),
            ));
        }
        let name = groups
            .next_group()?
            .filter(|name| name.code == 2)
            .ok_or_else(|| malformed(group.line, "SECTION 之后缺少组码 2 的段名"))?;
        if name.value == "ENTITIES" {
            read_entities(&mut groups, &mut document)?;
        } else {
            skip_section(&mut groups, group.line)?;
        }
    }
    Ok(document)
}

/// 一个组码及其值；`line` 是组码所在行号（从 1 开始）。
#[derive(Debug)]
struct Group {
    code: i32,
    value: String,
    line: usize,
}

impl Group {
    fn is_marker(&self, marker: &str) -> bool {
        self.code == 0 && self.value == marker
    }

    fn float(&self) -> Result<f64, IoError> {
        self.value.trim().parse().map_err(|_| {
            malformed(
                self.line,
                format!("组码 {} 的值 \"{}\" 不是数字", self.code, self.value),
            )
        })
    }

    fn integer(&self) -> Result<i64, IoError> {
        self.value.trim().parse().map_err(|_| {
            malformed(
                self.line,
                format!("组码 {} 的值 \"{}\" 不是整数", self.code, self.value),
            )
        })
    }
}

fn malformed(line: usize, message: impl Display) -> IoError {
    IoError::InvalidDocument(format!("第 {line} 行：{message}"))
}

struct Groups<'a> {
    lines: Enumerate<Lines<'a>>,
    peeked: Option<Group>,
}

impl<'a> Groups<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines().enumerate(),
            peeked: None,
        }
    }

    fn next_group(&mut self) -> Result<Option<Group>, IoError> {
        if let Some(group) = self.peeked.take() {
            return Ok(Some(group));
        }
        let Some((index, code_line)) = self.lines.next() else {
            return Ok(None);
        };
        let line = index + 1;
        let code = code_line
            .trim()
            .parse::<i32>()
            .map_err(|_| malformed(line, format!("组码 \"{}\" 不是整数", code_line.trim())))?;
        let (_, value) = self
            .lines
            .next()
            .ok_or_else(|| malformed(line, "组码之后缺少值行"))?;
        Ok(Some(Group {
            code,
            value: value.trim_end_matches('\r').to_string(),
            line,
        }))
    }

    /// 收集当前实体的属性组，停在下一个 0 组码之前。
    fn entity_body(&mut self) -> Result<Vec<Group>, IoError> {
        let mut body = Vec::new();
        while let Some(group) = self.next_group()? {
            if group.code == 0 {
                self.peeked = Some(group);
                break;
            }
            body.push(group);
        }
        Ok(body)
    }
}

fn skip_section(groups: &mut Groups<'_>, start_line: usize) -> Result<(), IoError> {
    while let Some(group) = groups.next_group()? {
        if group.is_marker("ENDSEC") {
            return Ok(());
        }
    }
    Err(malformed(start_line, "段没有以 ENDSEC 结束"))
}

fn read_entities(groups: &mut Groups<'_>, document: &mut CutDocument) -> Result<(), IoError> {
    loop {
        let Some(group) = groups.next_group()? else {
            return Err(IoError::InvalidDocument(
                "ENTITIES 段没有以 ENDSEC 结束".to_string(),
            ));
        };
        if group.code != 0 {
            return Err(malformed(
                group.line,
                format!("实体应以组码 0 开始，读到组码 {}", group.code),
            ));
        }
        match group.value.as_str() {
            "ENDSEC" => return Ok(()),
            "LWPOLYLINE" => {
                let body = groups.entity_body()?;
                document.add_entity(outline_from(&body, group.line)?);
            }
            "LINE" => {
                let body = groups.entity_body()?;
                document.add_entity(line_from(&body, group.line)?);
            }
            "POLYLINE" => {
                return Err(IoError::UnsupportedFeature(
                    "旧式 POLYLINE/VERTEX 轮廓，切割轮廓须为 LWPOLYLINE".to_string(),
                ));
            }
            _ => {
                groups.entity_body()?;
            }
        }
    }
}

fn outline_from(body: &[Group], start_line: usize) -> Result<CutEntity, IoError> {
    let mut layer = None;
    let mut is_closed = false;
    let mut declared = None;
    let mut vertices: Vec<PolylineVertex> = Vec::new();
    let mut pending_x = None;
    for group in body {
        match group.code {
            8 => layer = Some(group.value.trim().to_string()),
            70 => is_closed = (group.integer()? & 1) == 1,
            90 => {
                let count = group.integer()?;
                let count = usize::try_from(count).map_err(|_| {
                    malformed(group.line, format!("轮廓顶点数 {count} 不能为负"))
                })?;
                declared = Some(count);
            }
            10 => {
                if pending_x.replace(group.float()?).is_some() {
                    return Err(malformed(group.line, "上一个轮廓顶点缺少 Y 坐标（组码 20）"));
                }
            }
            20 => {
                let x = pending_x.take().ok_or_else(|| {
                    malformed(group.line, "轮廓顶点的 Y 坐标之前缺少 X（组码 10）")
                })?;
                vertices.push(PolylineVertex::new(Point2::new(x, group.float()?)));
            }
            42 => {
                let vertex = vertices
                    .last_mut()
                    .ok_or_else(|| malformed(group.line, "凸度（组码 42）出现在首个顶点之前"))?;
                vertex.bulge = group.float()?;
            }
            _ => {}
        }
    }

    if pending_x.is_some() {
        return Err(malformed(start_line, "轮廓最后一个顶点缺少 Y 坐标（组码 20）"));
    }
    if vertices.is_empty() {
        return Err(malformed(start_line, "轮廓没有任何顶点"));
    }
    if let Some(expected) = declared.filter(|&count| count != vertices.len()) {
        return Err(malformed(
            start_line,
            format!("轮廓声明 {expected} 个顶点，实际读到 {} 个", vertices.len()),
        ));
    }

    Ok(CutEntity::Polyline(Polyline {
        vertices,
        is_closed,
        layer: layer.unwrap_or_else(|| "0".to_string()),
    }))
}

fn line_from(body: &[Group], start_line: usize) -> Result<CutEntity, IoError> {
    let mut layer = None;
    // 起点 X/Y，终点 X/Y
    let mut coords: [Option<f64>; 4] = [None; 4];
    for group in body {
        let slot = match group.code {
            8 => {
                layer = Some(group.value.trim().to_string());
                continue;
            }
            10 => 0,
            20 => 1,
            11 => 2,
            21 => 3,
            _ => continue,
        };
        if coords[slot].replace(group.float()?).is_some() {
            return Err(malformed(group.line, format!("直线的组码 {} 重复", group.code)));
        }
    }

    let [Some(sx), Some(sy), Some(ex), Some(ey)] = coords else {
        return Err(malformed(start_line, "直线缺少端点坐标（组码 10/20/11/21）"));
    };
    Ok(CutEntity::Line(Line {
        start: Point2::new(sx, sy),
        end: Point2::new(ex, ey),
        layer: layer.unwrap_or_else(|| "0".to_string()),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(body: &str) -> String {
        format!("0\nSECTION\n2\nENTITIES\n{body}0\nENDSEC\n0\nEOF\n")
    }

    fn invalid_message(source: &str) -> String {
        match read_cut_document(source) {
            Err(IoError::InvalidDocument(message)) => message,
            other => panic!("expected invalid cut file, got {other:?}"),
        }
    }

    #[test]
    fn negative_vertex_count_is_rejected() {
        let source = entities("0\nLWPOLYLINE\n90\n-1\n10\n1.0\n20\n2.0\n");
        assert_eq!(invalid_message(&source), "第 7 行：轮廓顶点数 -1 不能为负");
    }

    #[test]
    fn declared_count_must_match_vertices() {
        let source = entities("0\nLWPOLYLINE\n90\n2\n10\n1.0\n20\n2.0\n");
        assert_eq!(
            invalid_message(&source),
            "第 5 行：轮廓声明 2 个顶点，实际读到 1 个"
        );

        let source = entities("0\nLWPOLYLINE\n8\nCutLines\n90\n1\n70\n1\n10\n1.0\n20\n2.0\n");
        let document = read_cut_document(&source).unwrap();
        let polyline = document.polylines().next().unwrap();
        assert!(polyline.is_closed);
        assert_eq!(polyline.layer, "CutLines");
    }

    #[test]
    fn vertex_coordinates_come_in_order() {
        let source = entities("0\nLWPOLYLINE\n20\n2.0\n10\n1.0\n");
        assert!(invalid_message(&source).contains("缺少 X"));

        let source = entities("0\nLWPOLYLINE\n10\n1.0\n10\n3.0\n20\n2.0\n");
        assert!(invalid_message(&source).contains("缺少 Y"));

        let source = entities("0\nLWPOLYLINE\n42\n0.5\n10\n1.0\n20\n2.0\n");
        assert!(invalid_message(&source).contains("首个顶点之前"));
    }

    #[test]
    fn line_needs_all_endpoints_once() {
        let source = entities("0\nLINE\n10\n0.0\n20\n0.0\n11\n5.0\n");
        assert!(invalid_message(&source).contains("直线缺少端点坐标"));

        let source = entities("0\nLINE\n10\n0.0\n10\n1.0\n20\n0.0\n11\n5.0\n21\n0.0\n");
        assert!(invalid_message(&source).contains("组码 10 重复"));
    }

    #[test]
    fn sections_must_be_terminated() {
        assert!(invalid_message("0\nSECTION\n2\nHEADER\n9\n$ACADVER\n").contains("ENDSEC"));
        assert!(invalid_message("0\nSECTION\n2\nENTITIES\n").contains("ENTITIES"));
        assert!(invalid_message("0\nSECTION\n9\nENTITIES\n").contains("段名"));
        assert!(invalid_message("0\nSECTION\n2\n").contains("缺少值行"));
    }

    #[test]
    fn crlf_line_endings_are_accepted() {
        let source = entities("0\nLINE\n8\nGUIDES\n10\n0.0\n20\n1.0\n11\n2.0\n21\n1.0\n")
            .replace('\n', "\r\n");
        let document = read_cut_document(&source).unwrap();
        assert_eq!(document.entities().count(), 1);
        assert_eq!(document.layers().count(), 2);
    }
}
