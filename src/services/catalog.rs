use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use rocket_okapi::okapi::schemars::JsonSchema;

use crate::models::{Guide, Vehicle, VehicleType};

/// Pure filter layer over guide/vehicle listings. All predicates are
/// AND-composed; an absent filter field matches everything.

#[derive(Debug, Default, FromForm, Deserialize, JsonSchema)]
pub struct GuideFilter {
    pub location: Option<String>,
    pub min_experience: Option<i32>,
    pub max_rate: Option<f64>,
    pub language: Option<String>,
    pub specialty: Option<String>,
}

#[derive(Debug, Default, FromForm, Deserialize, JsonSchema)]
pub struct VehicleFilter {
    pub vehicle_type: Option<VehicleType>,
    pub location: Option<String>,
    pub min_capacity: Option<i32>,
    pub max_rate: Option<f64>,
}

/// Distinct values across the listed guides, for building filter widgets.
#[derive(Debug, Serialize, JsonSchema)]
pub struct GuideFacets {
    pub locations: Vec<String>,
    pub languages: Vec<String>,
    pub specialties: Vec<String>,
}

#[derive(Debug, Serialize, JsonSchema)]
pub struct VehicleFacets {
    pub locations: Vec<String>,
    pub vehicle_types: Vec<String>,
}

pub fn filter_guides(guides: Vec<Guide>, filter: &GuideFilter) -> Vec<Guide> {
    guides
        .into_iter()
        .filter(|guide| {
            filter
                .location
                .as_ref()
                .map_or(true, |location| guide.locations.contains(location))
                && filter
                    .min_experience
                    .map_or(true, |years| guide.experience >= years)
                && filter.max_rate.map_or(true, |rate| guide.hourly_rate <= rate)
                && filter
                    .language
                    .as_ref()
                    .map_or(true, |language| guide.languages.contains(language))
                && filter
                    .specialty
                    .as_ref()
                    .map_or(true, |specialty| guide.specialties.contains(specialty))
        })
        .collect()
}

pub fn filter_vehicles(vehicles: Vec<Vehicle>, filter: &VehicleFilter) -> Vec<Vehicle> {
    vehicles
        .into_iter()
        .filter(|vehicle| {
            filter
                .vehicle_type
                .map_or(true, |kind| vehicle.vehicle_type == kind)
                && filter
                    .location
                    .as_ref()
                    .map_or(true, |location| vehicle.locations.contains(location))
                && filter
                    .min_capacity
                    .map_or(true, |seats| vehicle.capacity >= seats)
                && filter
                    .max_rate
                    .map_or(true, |rate| vehicle.hourly_rate <= rate)
        })
        .collect()
}

fn distinct_sorted<'a, I: Iterator<Item = &'a String>>(values: I) -> Vec<String> {
    values
        .cloned()
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

pub fn guide_facets(guides: &[Guide]) -> GuideFacets {
    GuideFacets {
        locations: distinct_sorted(guides.iter().flat_map(|g| g.locations.iter())),
        languages: distinct_sorted(guides.iter().flat_map(|g| g.languages.iter())),
        specialties: distinct_sorted(guides.iter().flat_map(|g| g.specialties.iter())),
    }
}

pub fn vehicle_facets(vehicles: &[Vehicle]) -> VehicleFacets {
    let vehicle_types: BTreeSet<&str> = vehicles
        .iter()
        .map(|v| v.vehicle_type.as_str())
        .collect();
    VehicleFacets {
        locations: distinct_sorted(vehicles.iter().flat_map(|v| v.locations.iter())),
        vehicle_types: vehicle_types.into_iter().map(str::to_string).collect(),
    }
}

#[cfg(test)]
mod tests {
    use mongodb::bson::{oid::ObjectId, DateTime};

    use super::*;
    use crate::models::Amenity;

    fn guide(locations: &[&str], languages: &[&str], specialties: &[&str], rate: f64, experience: i32) -> Guide {
        Guide {
            id: Some(ObjectId::new()),
            user: ObjectId::new(),
            guide_id: ObjectId::new().to_hex(),
            experience,
            languages: languages.iter().map(|s| s.to_string()).collect(),
            specialties: specialties.iter().map(|s| s.to_string()).collect(),
            bio: None,
            hourly_rate: rate,
            daily_rate: rate * 6.0,
            locations: locations.iter().map(|s| s.to_string()).collect(),
            is_verified: true,
            is_available: true,
            rating: 0.0,
            total_reviews: 0,
            created_at: DateTime::now(),
        }
    }

    fn vehicle(kind: VehicleType, locations: &[&str], capacity: i32, rate: f64) -> Vehicle {
        Vehicle {
            id: Some(ObjectId::new()),
            user: ObjectId::new(),
            vehicle_type: kind,
            vehicle_model: "Toyota HiAce".to_string(),
            vehicle_year: 2019,
            license_plate: "WP-1234".to_string(),
            capacity,
            amenities: vec![Amenity::Ac],
            hourly_rate: rate,
            daily_rate: rate * 6.0,
            driver_name: "Nuwan".to_string(),
            driver_phone: "+94771234567".to_string(),
            locations: locations.iter().map(|s| s.to_string()).collect(),
            is_verified: true,
            is_available: true,
            rating: 0.0,
            total_reviews: 0,
            created_at: DateTime::now(),
        }
    }

    #[test]
    fn filters_guides_by_location_and_max_rate() {
        let guides = vec![
            guide(&["Kandy", "Ella"], &["English"], &["hiking"], 40.0, 5),
            guide(&["Kandy"], &["English"], &["culture"], 60.0, 8),
            guide(&["Galle"], &["German"], &["history"], 30.0, 3),
        ];
        let filter = GuideFilter {
            location: Some("Kandy".to_string()),
            max_rate: Some(50.0),
            ..Default::default()
        };
        let matched = filter_guides(guides, &filter);
        assert_eq!(matched.len(), 1);
        assert!(matched[0].locations.contains(&"Kandy".to_string()));
        assert!(matched[0].hourly_rate <= 50.0);
    }

    #[test]
    fn filters_guides_by_language_and_experience() {
        let guides = vec![
            guide(&["Colombo"], &["English", "Tamil"], &[], 25.0, 10),
            guide(&["Colombo"], &["Sinhala"], &[], 25.0, 2),
        ];
        let filter = GuideFilter {
            language: Some("Tamil".to_string()),
            min_experience: Some(5),
            ..Default::default()
        };
        assert_eq!(filter_guides(guides, &filter).len(), 1);
    }

    #[test]
    fn empty_filter_matches_all() {
        let guides = vec![
            guide(&["Kandy"], &["English"], &[], 40.0, 5),
            guide(&["Galle"], &["German"], &[], 30.0, 3),
        ];
        assert_eq!(filter_guides(guides, &GuideFilter::default()).len(), 2);
    }

    #[test]
    fn filters_vehicles_by_type_and_capacity() {
        let vehicles = vec![
            vehicle(VehicleType::Van, &["Colombo"], 8, 20.0),
            vehicle(VehicleType::Car, &["Colombo"], 4, 15.0),
            vehicle(VehicleType::Van, &["Galle"], 12, 35.0),
        ];
        let filter = VehicleFilter {
            vehicle_type: Some(VehicleType::Van),
            min_capacity: Some(10),
            ..Default::default()
        };
        let matched = filter_vehicles(vehicles, &filter);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].capacity, 12);
    }

    #[test]
    fn guide_facets_are_distinct_and_sorted() {
        let guides = vec![
            guide(&["Kandy", "Ella"], &["English"], &["hiking"], 40.0, 5),
            guide(&["Ella", "Galle"], &["English", "German"], &["hiking", "wildlife"], 30.0, 3),
        ];
        let facets = guide_facets(&guides);
        assert_eq!(facets.locations, vec!["Ella", "Galle", "Kandy"]);
        assert_eq!(facets.languages, vec!["English", "German"]);
        assert_eq!(facets.specialties, vec!["hiking", "wildlife"]);
    }

    #[test]
    fn vehicle_facets_include_types() {
        let vehicles = vec![
            vehicle(VehicleType::Van, &["Colombo"], 8, 20.0),
            vehicle(VehicleType::Tuktuk, &["Kandy"], 3, 8.0),
            vehicle(VehicleType::Van, &["Kandy"], 8, 22.0),
        ];
        let facets = vehicle_facets(&vehicles);
        assert_eq!(facets.locations, vec!["Colombo", "Kandy"]);
        assert_eq!(facets.vehicle_types, vec!["tuktuk", "van"]);
    }
}
