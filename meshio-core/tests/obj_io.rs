use meshio_core::obj::{self, ObjData};
use meshio_core::{Material, MeshError, ObjAttribute, StlData, Vec3};
use std::path::PathBuf;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

const CUBE_VERTICES: [[f32; 3]; 8] = [
    [0.0, 0.0, 0.0],
    [1.0, 0.0, 0.0],
    [1.0, 1.0, 0.0],
    [0.0, 1.0, 0.0],
    [0.0, 0.0, 1.0],
    [1.0, 0.0, 1.0],
    [1.0, 1.0, 1.0],
    [0.0, 1.0, 1.0],
];

// 1-based, as written in cube_tri.obj
const CUBE_FACES: [[usize; 3]; 12] = [
    [1, 3, 2],
    [1, 4, 3],
    [2, 3, 7],
    [2, 7, 6],
    [6, 7, 8],
    [6, 8, 5],
    [5, 8, 4],
    [5, 4, 1],
    [1, 2, 6],
    [1, 6, 5],
    [4, 8, 7],
    [4, 7, 3],
];

#[test]
fn test_read_cube() {
    let data = obj::read(fixture("cube_tri.obj"), None).unwrap();
    assert_eq!(data.attributes.len(), 1);

    let cube = &data.attributes[0];
    assert_eq!(cube.name, "cube");
    assert_eq!(cube.geometry.positions.len(), 8);
    assert_eq!(cube.triangle_count(), 12);
    assert!(cube.geometry.tri_texture_indices.is_empty());
    assert!(cube.geometry.tri_normal_indices.is_empty());
    assert!(cube.geometry.check_indices().is_ok());

    for (tri, expected) in cube.geometry.tri_vertex_indices.iter().zip(CUBE_FACES) {
        for (corner, vertex) in tri.iter().zip(expected) {
            let p = cube.geometry.positions[*corner as usize];
            assert_eq!(p.xyz(), Vec3::from(CUBE_VERTICES[vertex - 1]));
            assert_eq!(p.w(), 1.0);
        }
    }

    assert_eq!(cube.material_ids, vec![0; 12]);
    assert_eq!(data.materials.len(), 1);
    let red = &data.materials[0];
    assert_eq!(red.name, "red");
    assert_eq!(red.diffuse, [0.8, 0.1, 0.1]);
    assert_eq!(red.shininess, 32.0);
    assert_eq!(red.illum, 2);
    assert_eq!(red.diffuse_texname, "red.png");
    assert_eq!(red.transmittance, [0.9, 0.8, 0.7]);
    assert_eq!(red.emission, [0.2, 0.0, 0.0]);
    assert_eq!(red.displacement_texname, "red_disp.png");
}

#[test]
fn test_read_write_read_is_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cube_tri_write.obj");

    let first = obj::read(fixture("cube_tri.obj"), None).unwrap();
    obj::write(&path, &first).unwrap();
    assert!(dir.path().join("cube_tri_write.mtl").exists());

    let second = obj::read(&path, None).unwrap();
    assert!(second.attributes_equal(&first));
    assert!(second.materials_equal(&first));
    assert_eq!(second, first);
}

#[test]
fn test_material_base_path_override() {
    let empty = tempfile::tempdir().unwrap();
    let data = obj::read(fixture("cube_tri.obj"), Some(empty.path())).unwrap();
    assert!(data.materials.is_empty());
    assert_eq!(data.triangle_count(), 12);

    let data = obj::read(fixture("cube_tri.obj"), Some(&fixture(""))).unwrap();
    assert_eq!(data.materials.len(), 1);
}

#[test]
fn test_triangle_soup_through_obj() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("soup.obj");
    let document = ObjData {
        attributes: vec![ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube())],
        materials: Vec::new(),
    };

    obj::write(&path, &document).unwrap();
    assert!(!dir.path().join("soup.mtl").exists());

    let read_back = obj::read(&path, None).unwrap();
    assert_eq!(read_back, document);
    assert_eq!(
        read_back.attributes[0].to_triangle_soup().unwrap(),
        StlData::unit_cube()
    );
}

#[test]
fn test_group_order_matters() {
    let a = ObjAttribute::from_triangle_soup("a", &StlData::unit_cube());
    let b = ObjAttribute::from_triangle_soup("b", &StlData::unit_cube());
    let forward = ObjData {
        attributes: vec![a.clone(), b.clone()],
        materials: Vec::new(),
    };
    let backward = ObjData {
        attributes: vec![b, a],
        materials: Vec::new(),
    };
    assert_ne!(forward, backward);
}

#[test]
fn test_missing_paths_fail() {
    let err = obj::read("/home/nonexistent/cube.obj", None).unwrap_err();
    assert!(matches!(err, MeshError::FileNotFound(_)));

    let data = obj::read(fixture("cube_tri.obj"), None).unwrap();
    let err = obj::write("/home/nonexistent/cube.obj", &data).unwrap_err();
    assert!(matches!(err, MeshError::FileNotFound(_)));
}

#[test]
fn test_clear_empties_document() {
    let mut data = obj::read(fixture("cube_tri.obj"), None).unwrap();
    data.clear();
    assert_eq!(data, ObjData::new());
}

fn write_then_read(document: &ObjData) -> ObjData {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("document.obj");
    obj::write(&path, document).unwrap();
    obj::read(&path, None).unwrap()
}

fn palette() -> Vec<Material> {
    vec![
        Material {
            diffuse: [0.8, 0.1, 0.1],
            emission: [0.5, 0.25, 0.125],
            transmittance: [0.9, 0.9, 0.9],
            displacement_texname: "ripple.png".to_string(),
            ..Material::new("red")
        },
        Material {
            diffuse: [0.1, 0.1, 0.8],
            ior: 1.5,
            illum: 4,
            ..Material::new("blue")
        },
    ]
}

#[test]
fn test_material_fields_survive_write_read() {
    let mut cube = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
    cube.material_ids = vec![1; 12];
    let document = ObjData {
        attributes: vec![cube],
        materials: palette(),
    };

    let read_back = write_then_read(&document);
    assert!(read_back.materials_equal(&document));
    assert_eq!(read_back.materials[0].emission, [0.5, 0.25, 0.125]);
}

#[test]
fn test_multi_material_group_stays_one_attribute() {
    let mut cube = ObjAttribute::from_triangle_soup("cube", &StlData::unit_cube());
    cube.material_ids = vec![0; 12];
    cube.material_ids[6..].fill(1);
    let document = ObjData {
        attributes: vec![cube],
        materials: palette(),
    };

    let read_back = write_then_read(&document);
    assert_eq!(read_back.attributes.len(), 1);
    assert_eq!(read_back.attributes[0].material_ids, document.attributes[0].material_ids);
    assert_eq!(read_back, document);
}

#[test]
fn test_unassigned_material_sentinel_is_kept() {
    let mut mixed = ObjAttribute::from_triangle_soup("mixed", &StlData::unit_cube());
    mixed.material_ids = vec![0; 12];
    mixed.material_ids[6..].fill(-1);
    let plain = ObjAttribute::from_triangle_soup("plain", &StlData::unit_cube());
    let document = ObjData {
        attributes: vec![mixed, plain],
        materials: palette(),
    };

    let read_back = write_then_read(&document);
    let ids: Vec<&[i32]> = read_back
        .attributes
        .iter()
        .map(|a| a.material_ids.as_slice())
        .collect();
    assert_eq!(ids, vec![&document.attributes[0].material_ids[..], &[][..]]);
    assert_eq!(read_back, document);
}

#[test]
fn test_unnamed_group_keeps_empty_name() {
    let document = ObjData {
        attributes: vec![
            ObjAttribute::from_triangle_soup("", &StlData::unit_cube()),
            ObjAttribute::from_triangle_soup("after", &StlData::unit_cube()),
        ],
        materials: Vec::new(),
    };

    let read_back = write_then_read(&document);
    assert_eq!(read_back.attributes[0].name, "");
    assert_eq!(read_back.attributes[1].name, "after");
    assert_eq!(read_back, document);
}
