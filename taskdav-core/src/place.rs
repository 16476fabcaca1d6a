//! Keeping a task's geofence in line with a remote GEO position.

use tracing::debug;

use crate::config::GeofenceDefaults;
use crate::error::TaskDavResult;
use crate::location::{Geo, Geofence, Location, Place, coordinate_key};
use crate::store::LocationStore;
use crate::work::BackgroundWork;

/// The task's geofence together with its place.
pub async fn location_for_task<S: LocationStore>(store: &mut S, task: i64) -> TaskDavResult<Option<Location>> {
    let Some(geofence) = store.geofence_for_task(task).await? else {
        return Ok(None);
    };
    Ok(store
        .place_by_uid(&geofence.place)
        .await?
        .map(|place| Location { geofence, place }))
}

/// Point the task's geofence at `geo`, or remove its geofences when `geo` is
/// `None`. Places are never deleted.
pub async fn apply_geo<S, W>(
    store: &mut S,
    work: &W,
    defaults: &GeofenceDefaults,
    task: i64,
    geo: Option<Geo>,
) -> TaskDavResult<()>
where
    S: LocationStore,
    W: BackgroundWork,
{
    let Some(geo) = geo else {
        for geofence in store.active_geofences(task).await? {
            debug!(task, geofence = geofence.id, "Removing geofence");
            store.delete_geofence(geofence.id).await?;
            if let Some(place) = store.place_by_uid(&geofence.place).await? {
                work.update_geofences(&place);
            }
        }
        return Ok(());
    };

    let latitude = coordinate_key(geo.latitude);
    let longitude = coordinate_key(geo.longitude);
    let place = match store.find_place(&latitude, &longitude).await? {
        Some(place) => place,
        None => {
            let place = store.insert_place(Place::new(geo)).await?;
            debug!(task, place = %place.uid, "Created place");
            work.reverse_geocode(&place);
            place
        }
    };

    match store.geofence_for_task(task).await? {
        None => {
            store
                .insert_geofence(Geofence::new(task, &place.uid, defaults))
                .await?;
        }
        Some(mut geofence) if geofence.place != place.uid => {
            let previous = std::mem::replace(&mut geofence.place, place.uid.clone());
            store.update_geofence(&geofence).await?;
            if let Some(old_place) = store.place_by_uid(&previous).await? {
                work.update_geofences(&old_place);
            }
        }
        Some(_) => {}
    }

    work.update_geofences(&place);
    Ok(())
}
