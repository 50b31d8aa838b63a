use std::io::{Seek, Write};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::NodeError;
use crate::mesh::Mesh;

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="model" ContentType="application/vnd.ms-package.3dmanufacturing-3dmodel+xml"/>
</Types>
"#;

const RELATIONSHIPS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Target="/3D/3dmodel.model" Id="rel0" Type="http://schemas.microsoft.com/3dmanufacturing/2013/01/3dmodel"/>
</Relationships>
"#;

pub(crate) const MODEL_PATH: &str = "3D/3dmodel.model";

/// 3MF package: an OPC zip holding one mesh object and one build item.
pub fn write_3mf<W: Write + Seek>(writer: W, mesh: &Mesh) -> Result<(), NodeError> {
    let triangles = mesh.triangles()?;
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let mut zip = ZipWriter::new(writer);

    zip.start_file("[Content_Types].xml", options)
        .map_err(|err| NodeError::export("3mf", err))?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)
        .map_err(|err| NodeError::export("3mf", err))?;
    zip.write_all(RELATIONSHIPS.as_bytes())?;

    zip.start_file(MODEL_PATH, options)
        .map_err(|err| NodeError::export("3mf", err))?;
    writeln!(zip, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        zip,
        r#"<model unit="millimeter" xml:lang="en-US" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">"#
    )?;
    writeln!(zip, "  <resources>")?;
    writeln!(zip, r#"    <object id="1" type="model">"#)?;
    writeln!(zip, "      <mesh>")?;
    writeln!(zip, "        <vertices>")?;
    for [x, y, z] in &mesh.positions {
        writeln!(zip, r#"          <vertex x="{x}" y="{y}" z="{z}"/>"#)?;
    }
    writeln!(zip, "        </vertices>")?;
    writeln!(zip, "        <triangles>")?;
    for [a, b, c] in triangles {
        writeln!(zip, r#"          <triangle v1="{a}" v2="{b}" v3="{c}"/>"#)?;
    }
    writeln!(zip, "        </triangles>")?;
    writeln!(zip, "      </mesh>")?;
    writeln!(zip, "    </object>")?;
    writeln!(zip, "  </resources>")?;
    writeln!(zip, "  <build>")?;
    writeln!(zip, r#"    <item objectid="1"/>"#)?;
    writeln!(zip, "  </build>")?;
    writeln!(zip, "</model>")?;

    zip.finish().map_err(|err| NodeError::export("3mf", err))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use super::*;
    use crate::mesh::make_box;

    #[test]
    fn package_contains_model_parts() {
        let mut cursor = Cursor::new(Vec::new());
        write_3mf(&mut cursor, &make_box([1.0, 1.0, 1.0])).unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(cursor.into_inner())).unwrap();
        assert!(archive.by_name("[Content_Types].xml").is_ok());
        assert!(archive.by_name("_rels/.rels").is_ok());

        let mut model = String::new();
        archive
            .by_name(MODEL_PATH)
            .unwrap()
            .read_to_string(&mut model)
            .unwrap();
        assert_eq!(model.matches("<vertex ").count(), 8);
        assert_eq!(model.matches("<triangle ").count(), 12);
        assert!(model.contains(r#"<vertex x="-0.5" y="-0.5" z="-0.5"/>"#));
        assert!(model.contains(r#"<item objectid="1"/>"#));
    }
}
