use std::io::{Read, Write};

use anyhow::Result;
use integer_encoding::*;

use crate::routing::RoutingProfile;
use crate::utils::GeoPoint;

/// A bare (longitude, latitude) pair, used once timestamps are no longer
/// needed. Temporal ordering is gone by design.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Waypoint {
    pub longitude: f64,
    pub latitude: f64,
}

impl GeoPoint for Waypoint {
    fn latitude(&self) -> f64 {
        self.latitude
    }
    fn longitude(&self) -> f64 {
        self.longitude
    }
}

/// The reconstructed route of a finalized trip. `snapped` is true only when
/// at least one segment was actually aligned by the routing lookup rather
/// than interpolated.
#[derive(Clone, Debug, PartialEq)]
pub struct RouteGeometry {
    pub profile: RoutingProfile,
    pub snapped: bool,
    pub waypoints: Vec<Waypoint>,
}

const ROUTE_GEOMETRY_MAGIC_HEADER: [u8; 2] = [b'R', b'0'];

// 3 is the zstd default
pub const ZSTD_COMPRESS_LEVEL: i32 = 3;

impl RouteGeometry {
    pub fn serialize<T: Write>(&self, mut writer: T) -> Result<()> {
        // magic header and flags stay uncompressed so they can be sniffed
        writer.write_all(&ROUTE_GEOMETRY_MAGIC_HEADER)?;
        writer.write_all(&[self.profile.to_int() as u8, self.snapped as u8])?;

        let mut encoder = zstd::Encoder::new(writer, ZSTD_COMPRESS_LEVEL)?.auto_finish();
        encoder.write_all(&(self.waypoints.len() as u64).encode_var_vec())?;
        for waypoint in &self.waypoints {
            encoder.write_all(&waypoint.longitude.to_be_bytes())?;
            encoder.write_all(&waypoint.latitude.to_be_bytes())?;
        }
        Ok(())
    }

    pub fn deserialize<T: Read>(mut reader: T) -> Result<RouteGeometry> {
        let mut magic_header: [u8; 2] = [0; 2];
        reader.read_exact(&mut magic_header)?;
        if magic_header != ROUTE_GEOMETRY_MAGIC_HEADER {
            bail!(
                "Invalid magic header, expect: {:?}, got: {:?}",
                ROUTE_GEOMETRY_MAGIC_HEADER,
                &magic_header
            );
        }
        let mut flags: [u8; 2] = [0; 2];
        reader.read_exact(&mut flags)?;
        let profile = RoutingProfile::of_int(flags[0] as i8)?;
        let snapped = flags[1] != 0;

        let mut decoder = zstd::Decoder::new(reader)?;
        let count: u64 = decoder.read_varint()?;
        let mut waypoints = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut buf: [u8; 8] = [0; 8];
            decoder.read_exact(&mut buf)?;
            let longitude = f64::from_be_bytes(buf);
            decoder.read_exact(&mut buf)?;
            let latitude = f64::from_be_bytes(buf);
            waypoints.push(Waypoint {
                longitude,
                latitude,
            });
        }
        Ok(RouteGeometry {
            profile,
            snapped,
            waypoints,
        })
    }
}
