//! Object lookup across every backend a database knows about.
//!
//! Loose objects are checked before packs, and packs before alternates,
//! since a loose object is the most likely to be the newest write (e.g.
//! mid-repack, before the old pack has been removed).

use git_hash::ObjectId;
use git_object::Object;

use crate::{ObjectDatabase, ObjectInfo, OdbError};

/// Resolve a REF_DELTA/OFS_DELTA base that lives outside the pack currently
/// being read: first in loose storage, then in every other open pack.
fn resolve_base_elsewhere<'a>(
    odb: &'a ObjectDatabase,
    packs: &'a [git_pack::pack::PackFile],
    excluding: &'a git_pack::pack::PackFile,
) -> impl Fn(&ObjectId) -> Option<(git_object::ObjectType, Vec<u8>)> + 'a {
    move |base_oid| {
        if let Ok(Some(obj)) = odb.loose.read(base_oid) {
            return Some((obj.object_type(), obj.serialize_content()));
        }
        packs
            .iter()
            .filter(|p| !std::ptr::eq(*p, excluding))
            .find_map(|p| p.read_object(base_oid).ok().flatten())
            .map(|packed| (packed.obj_type, packed.data))
    }
}

/// Find an object by OID, searching all backends in order.
pub(crate) fn find_object(
    odb: &ObjectDatabase,
    oid: &ObjectId,
) -> Result<Option<Object>, OdbError> {
    if let Some(obj) = odb.loose.read(oid)? {
        return Ok(Some(obj));
    }

    let packs = odb.packs.read().unwrap();
    for pack in packs.iter() {
        let resolver = resolve_base_elsewhere(odb, &packs, pack);
        if let Some(packed) = pack.read_object_with_resolver(oid, resolver)? {
            let obj = Object::parse_content(packed.obj_type, &packed.data).map_err(|e| {
                OdbError::Corrupt {
                    oid: *oid,
                    reason: e.to_string(),
                }
            })?;
            return Ok(Some(obj));
        }
    }
    drop(packs);

    for alt in &odb.alternates {
        if let Some(obj) = alt.read(oid)? {
            return Ok(Some(obj));
        }
    }

    Ok(None)
}

/// Find an object header by OID, searching all backends in order.
pub(crate) fn find_header(
    odb: &ObjectDatabase,
    oid: &ObjectId,
) -> Result<Option<ObjectInfo>, OdbError> {
    if let Some((obj_type, size)) = odb.loose.read_header(oid)? {
        return Ok(Some(ObjectInfo { obj_type, size }));
    }

    {
        let packs = odb.packs.read().unwrap();
        for pack in packs.iter() {
            if let Some(packed) = pack.read_object(oid)? {
                return Ok(Some(ObjectInfo {
                    obj_type: packed.obj_type,
                    size: packed.data.len(),
                }));
            }
        }
    }

    for alt in &odb.alternates {
        if let Some(info) = alt.read_header(oid)? {
            return Ok(Some(info));
        }
    }

    Ok(None)
}

/// Check if an object exists in any backend (fast, no decompression for packs).
pub(crate) fn object_exists(odb: &ObjectDatabase, oid: &ObjectId) -> bool {
    odb.loose.contains(oid)
        || odb.packs.read().unwrap().iter().any(|pack| pack.contains(oid))
        || odb.alternates.iter().any(|alt| alt.contains(oid))
}
