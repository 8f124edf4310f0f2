//! Idempotent find-or-create of the local records an Amazon order refers to.

use mwsync_core::{
    Address, AddressFields, Channel, CodeType, ContactKind, ContactMechanism, Country, NewProduct,
    Party, Product, ProductCode, Subdivision,
};
use mwsync_mws::{MwsApi, ShippingAddress};
use rust_decimal::Decimal;

use crate::error::EngineError;
use crate::store::Store;

/// `IdType` used to look products up by seller SKU.
pub const SELLER_SKU_ID_TYPE: &str = "SellerSKU";

/// List and cost price given to products created from marketplace data,
/// which carries no authoritative pricing.
pub const PLACEHOLDER_PRICE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Country and subdivision resolved for a shipping address.
#[derive(Debug, Clone)]
pub struct Location {
    pub country: Country,
    pub subdivision: Subdivision,
}

/// Picks the subdivision named by `region`: an exact `"<CC>-<region>"` code
/// first, then a unique case-insensitive name match.
///
/// # Errors
///
/// Returns [`EngineError::SubdivisionNotFound`] when nothing matches and
/// [`EngineError::AmbiguousSubdivision`] when several names match equally.
pub fn match_subdivision(
    country: &Country,
    subdivisions: &[Subdivision],
    region: &str,
) -> Result<Subdivision, EngineError> {
    let region = region.trim();
    let code = format!("{}-{}", country.code, region);
    if let Some(found) = subdivisions.iter().find(|s| s.code == code) {
        return Ok(found.clone());
    }

    let needle = region.to_lowercase();
    if !needle.is_empty() {
        if let Some(found) = subdivisions
            .iter()
            .find(|s| s.name.to_lowercase() == needle)
        {
            return Ok(found.clone());
        }

        let partial: Vec<&Subdivision> = subdivisions
            .iter()
            .filter(|s| s.name.to_lowercase().contains(&needle))
            .collect();
        match partial.as_slice() {
            [only] => return Ok((*only).clone()),
            [] => {}
            many => {
                return Err(EngineError::AmbiguousSubdivision {
                    region: region.to_string(),
                    country: country.code.clone(),
                    candidates: many
                        .iter()
                        .map(|s| s.name.as_str())
                        .collect::<Vec<_>>()
                        .join(", "),
                });
            }
        }
    }

    Err(EngineError::SubdivisionNotFound {
        region: region.to_string(),
        country: country.code.clone(),
    })
}

/// Resolves parties, addresses and products for one channel.
pub struct EntityResolver<'a, S, A> {
    store: &'a S,
    api: &'a A,
    channel: &'a Channel,
}

impl<'a, S: Store, A: MwsApi> EntityResolver<'a, S, A> {
    pub fn new(store: &'a S, api: &'a A, channel: &'a Channel) -> Self {
        Self {
            store,
            api,
            channel,
        }
    }

    /// Returns the party that owns `email`, creating it (with an email
    /// contact mechanism) on first sight.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn resolve_party(&self, name: &str, email: &str) -> Result<Party, EngineError> {
        if let Some(party) = self.store.find_party_by_email(email).await? {
            return Ok(party);
        }

        let party = self.store.create_party(name, email).await?;
        self.attach_contact(&party, ContactKind::Email, email).await?;
        tracing::info!(party_id = party.id, "created party");
        Ok(party)
    }

    /// Adds `phone` to the party unless a phone or mobile mechanism already
    /// holds that number. Blank numbers are ignored.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn attach_phone(
        &self,
        party: &Party,
        phone: &str,
    ) -> Result<Option<ContactMechanism>, EngineError> {
        let phone = phone.trim();
        if phone.is_empty() {
            return Ok(None);
        }
        self.attach_contact(party, ContactKind::Phone, phone)
            .await
            .map(Some)
    }

    async fn attach_contact(
        &self,
        party: &Party,
        kind: ContactKind,
        value: &str,
    ) -> Result<ContactMechanism, EngineError> {
        let existing = self.store.list_contact_mechanisms(party.id).await?;
        let same_family = |m: &&ContactMechanism| {
            if kind.is_telephone() {
                m.kind.is_telephone()
            } else {
                m.kind == kind
            }
        };
        if let Some(found) = existing
            .iter()
            .filter(same_family)
            .find(|m| m.value == value)
        {
            return Ok(found.clone());
        }

        Ok(self
            .store
            .add_contact_mechanism(party.id, kind, value)
            .await?)
    }

    /// Looks up the country and subdivision of a shipping address without
    /// writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownCountry`], [`EngineError::SubdivisionNotFound`]
    /// or [`EngineError::AmbiguousSubdivision`].
    pub async fn resolve_location(
        &self,
        address: &ShippingAddress,
    ) -> Result<Location, EngineError> {
        let country_code = address.country_code.trim();
        let country = self
            .store
            .find_country(country_code)
            .await?
            .ok_or_else(|| EngineError::UnknownCountry(country_code.to_string()))?;
        let subdivisions = self.store.list_subdivisions(country.id).await?;
        let subdivision = match_subdivision(&country, &subdivisions, &address.state_or_region)?;
        Ok(Location {
            country,
            subdivision,
        })
    }

    /// Returns the party's address equal to `address` in every field,
    /// creating it if none is.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn resolve_address(
        &self,
        party: &Party,
        address: &ShippingAddress,
        location: &Location,
    ) -> Result<Address, EngineError> {
        let candidate = AddressFields {
            name: address.name.trim().to_string(),
            street: address.address_line1.trim().to_string(),
            streetbis: address.street_bis(),
            zip: address.postal_code.trim().to_string(),
            city: address.city.trim().to_string(),
            country_id: location.country.id,
            subdivision_id: location.subdivision.id,
        };

        let existing = self.store.list_addresses(party.id).await?;
        if let Some(found) = existing.into_iter().find(|a| a.matches(&candidate)) {
            return Ok(found);
        }

        let created = self.store.create_address(party.id, &candidate).await?;
        tracing::debug!(party_id = party.id, address_id = created.id, "created address");
        Ok(created)
    }

    /// Returns the product with seller SKU `sku`, creating it from Amazon's
    /// catalog data on a miss.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ProductLookup`] if Amazon does not know the SKU,
    /// or propagates API and store failures.
    pub async fn resolve_product(&self, sku: &str) -> Result<Product, EngineError> {
        if let Some(product) = self.store.find_product_by_code(sku).await? {
            return Ok(product);
        }

        let matches = self
            .api
            .get_matching_product_for_id(&self.channel.marketplace_id, SELLER_SKU_ID_TYPE, &[sku])
            .await?;
        let lookup_failed = |reason: &str| EngineError::ProductLookup {
            sku: sku.to_string(),
            reason: reason.to_string(),
        };

        let found = matches
            .iter()
            .find(|m| m.id == sku)
            .or_else(|| matches.first())
            .ok_or_else(|| lookup_failed("empty response"))?;
        if let Some(error) = &found.error {
            let reason = error.message.as_deref().unwrap_or(error.code.as_str());
            return Err(lookup_failed(reason));
        }
        let product = found
            .first_product()
            .ok_or_else(|| lookup_failed("no product returned"))?;
        let attributes = product
            .primary_attributes()
            .ok_or_else(|| lookup_failed("no attribute set"))?;

        let codes = product
            .asin()
            .map(|asin| ProductCode {
                code_type: CodeType::Asin,
                code: asin.to_string(),
            })
            .into_iter()
            .collect();

        let new_product = NewProduct {
            name: attributes.title.clone(),
            code: sku.to_string(),
            description: Some(attributes.title.clone()),
            list_price: PLACEHOLDER_PRICE,
            cost_price: PLACEHOLDER_PRICE,
            default_uom: self.channel.default_uom.clone(),
            sale_uom: self.channel.default_uom.clone(),
            salable: true,
            account_revenue: self.channel.default_account_revenue.clone(),
            account_expense: self.channel.default_account_expense.clone(),
            codes,
            channel_id: self.channel.id,
        };

        let created = self.store.create_product(&new_product).await?;
        tracing::info!(sku, product_id = created.id, "created product from Amazon catalog");
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn country() -> Country {
        Country {
            id: 1,
            code: "US".to_string(),
            name: "United States".to_string(),
        }
    }

    fn subdivisions() -> Vec<Subdivision> {
        [
            (10, "US-CA", "California"),
            (11, "US-VA", "Virginia"),
            (12, "US-WV", "West Virginia"),
            (13, "US-NY", "New York"),
        ]
        .into_iter()
        .map(|(id, code, name)| Subdivision {
            id,
            country_id: 1,
            code: code.to_string(),
            name: name.to_string(),
        })
        .collect()
    }

    #[test]
    fn matches_by_code_first() {
        let found = match_subdivision(&country(), &subdivisions(), "CA").unwrap();
        assert_eq!(found.id, 10);
    }

    #[test]
    fn falls_back_to_case_insensitive_name() {
        let found = match_subdivision(&country(), &subdivisions(), "new york").unwrap();
        assert_eq!(found.id, 13);
    }

    #[test]
    fn exact_name_beats_wider_substring() {
        let found = match_subdivision(&country(), &subdivisions(), "Virginia").unwrap();
        assert_eq!(found.id, 11);
    }

    #[test]
    fn unique_substring_matches() {
        let found = match_subdivision(&country(), &subdivisions(), "Califor").unwrap();
        assert_eq!(found.id, 10);
    }

    #[test]
    fn ambiguous_substring_is_an_error() {
        let err = match_subdivision(&country(), &subdivisions(), "irgin").unwrap_err();
        assert!(matches!(err, EngineError::AmbiguousSubdivision { .. }), "{err}");
    }

    #[test]
    fn unknown_region_is_an_error() {
        let err = match_subdivision(&country(), &subdivisions(), "Ontario").unwrap_err();
        assert_eq!(err.to_string(), "state 'Ontario' does not exist in country US");
    }

    #[test]
    fn placeholder_price_is_one_cent() {
        assert_eq!(PLACEHOLDER_PRICE, Decimal::new(1, 2));
    }
}
