use std::io::Write;

use crate::error::NodeError;
use crate::mesh::Mesh;

/// COLLADA 1.4.1 document with one geometry instanced by one scene node.
pub fn write_dae<W: Write>(writer: &mut W, mesh: &Mesh) -> Result<(), NodeError> {
    let triangles = mesh.triangles()?;
    let normals = mesh.point_normals();

    writeln!(writer, r#"<?xml version="1.0" encoding="utf-8"?>"#)?;
    writeln!(
        writer,
        r#"<COLLADA xmlns="http://www.collada.org/2005/11/COLLADASchema" version="1.4.1">"#
    )?;
    writeln!(writer, "  <asset>")?;
    writeln!(writer, "    <contributor><authoring_tool>Koala</authoring_tool></contributor>")?;
    writeln!(writer, r#"    <unit name="meter" meter="1"/>"#)?;
    writeln!(writer, "    <up_axis>Y_UP</up_axis>")?;
    writeln!(writer, "  </asset>")?;
    writeln!(writer, "  <library_geometries>")?;
    writeln!(writer, r#"    <geometry id="mesh0" name="mesh0">"#)?;
    writeln!(writer, "      <mesh>")?;
    write_source(writer, "mesh0-positions", &mesh.positions)?;
    if let Some(normals) = normals {
        write_source(writer, "mesh0-normals", normals)?;
    }
    writeln!(writer, r#"        <vertices id="mesh0-vertices">"#)?;
    writeln!(
        writer,
        r##"          <input semantic="POSITION" source="#mesh0-positions"/>"##
    )?;
    if normals.is_some() {
        writeln!(
            writer,
            r##"          <input semantic="NORMAL" source="#mesh0-normals"/>"##
        )?;
    }
    writeln!(writer, "        </vertices>")?;
    writeln!(writer, r#"        <triangles count="{}">"#, triangles.len())?;
    writeln!(
        writer,
        r##"          <input semantic="VERTEX" source="#mesh0-vertices" offset="0"/>"##
    )?;
    write!(writer, "          <p>")?;
    for (i, [a, b, c]) in triangles.iter().enumerate() {
        if i > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{a} {b} {c}")?;
    }
    writeln!(writer, "</p>")?;
    writeln!(writer, "        </triangles>")?;
    writeln!(writer, "      </mesh>")?;
    writeln!(writer, "    </geometry>")?;
    writeln!(writer, "  </library_geometries>")?;
    writeln!(writer, "  <library_visual_scenes>")?;
    writeln!(writer, r#"    <visual_scene id="scene0" name="scene0">"#)?;
    writeln!(writer, r#"      <node id="node0" name="mesh0">"#)?;
    writeln!(writer, r##"        <instance_geometry url="#mesh0"/>"##)?;
    writeln!(writer, "      </node>")?;
    writeln!(writer, "    </visual_scene>")?;
    writeln!(writer, "  </library_visual_scenes>")?;
    writeln!(writer, "  <scene>")?;
    writeln!(writer, r##"    <instance_visual_scene url="#scene0"/>"##)?;
    writeln!(writer, "  </scene>")?;
    writeln!(writer, "</COLLADA>")?;
    Ok(())
}

fn write_source<W: Write>(writer: &mut W, id: &str, data: &[[f32; 3]]) -> Result<(), NodeError> {
    writeln!(writer, r#"        <source id="{id}">"#)?;
    write!(
        writer,
        r#"          <float_array id="{id}-array" count="{}">"#,
        data.len() * 3
    )?;
    for (i, value) in data.as_flattened().iter().enumerate() {
        if i > 0 {
            write!(writer, " ")?;
        }
        write!(writer, "{value}")?;
    }
    writeln!(writer, "</float_array>")?;
    writeln!(writer, "          <technique_common>")?;
    writeln!(
        writer,
        r##"            <accessor source="#{id}-array" count="{}" stride="3">"##,
        data.len()
    )?;
    writeln!(writer, r#"              <param name="X" type="float"/>"#)?;
    writeln!(writer, r#"              <param name="Y" type="float"/>"#)?;
    writeln!(writer, r#"              <param name="Z" type="float"/>"#)?;
    writeln!(writer, "            </accessor>")?;
    writeln!(writer, "          </technique_common>")?;
    writeln!(writer, "        </source>")?;
    Ok(())
}
