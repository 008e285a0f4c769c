//! REST API endpoints for lots.
//!
//! A lot is created together with its line items, then driven through
//! numbered bidding rounds. Once offers are in, the allocation view shows the
//! best bid per line, and accepting it records the winners as awards. Every
//! route here requires the management permission.

use crate::ApiApplication;
use aide::axum::{
    ApiRouter,
    routing::{get, post, put},
};

mod allocation;
use allocation::*;

mod crud;
use crud::*;

mod rounds;
use rounds::*;

/// Path parameter for lot-specific endpoints.
#[derive(serde::Deserialize, schemars::JsonSchema)]
#[schemars(inline)]
struct Id<T> {
    /// The unique identifier of the lot
    lot_id: T,
}

/// Creates a router with lot-related endpoints.
pub fn router<T: ApiApplication>() -> ApiRouter<T> {
    ApiRouter::new()
        .api_route_with("/", post(create_lot::<T>), |route| {
            route.security_requirement("jwt").tag("lot").tag("admin")
        })
        .api_route_with("/{lot_id}", get(get_lot::<T>), |route| {
            route.security_requirement("jwt").tag("lot")
        })
        .api_route_with(
            "/{lot_id}/lines",
            get(list_lines::<T>).post(add_lines::<T>),
            |route| route.security_requirement("jwt").tag("lot"),
        )
        .api_route_with("/{lot_id}/status", put(set_status::<T>), |route| {
            route.security_requirement("jwt").tag("lot").tag("admin")
        })
        .api_route_with("/{lot_id}/rounds", get(list_rounds::<T>), |route| {
            route.security_requirement("jwt").tag("round")
        })
        .api_route_with(
            "/{lot_id}/rounds/current",
            get(get_current_round::<T>).post(ensure_current_round::<T>),
            |route| route.security_requirement("jwt").tag("round"),
        )
        .api_route_with("/{lot_id}/rounds/next", post(next_round::<T>), |route| {
            route.security_requirement("jwt").tag("round").tag("admin")
        })
        .api_route_with("/{lot_id}/offers", get(list_offers::<T>), |route| {
            route.security_requirement("jwt").tag("allocation")
        })
        .api_route_with(
            "/{lot_id}/allocation",
            get(get_allocation::<T>),
            |route| route.security_requirement("jwt").tag("allocation"),
        )
        .api_route_with(
            "/{lot_id}/allocation/accept",
            post(accept_allocation::<T>),
            |route| {
                route
                    .security_requirement("jwt")
                    .tag("allocation")
                    .tag("admin")
            },
        )
        .api_route_with("/{lot_id}/awards", get(list_awards::<T>), |route| {
            route.security_requirement("jwt").tag("allocation")
        })
}
