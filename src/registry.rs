//! Auction factory and registry.
//!
//! Deploys a token and a [`DutchAuction`] per sale, registers an automation
//! upkeep for it funded with the funding token, and keeps the books:
//! - creation-ordered list of auctions (ids start at 1)
//! - validity set of auction addresses
//! - index from creator to the auctions they created

use std::{collections::HashMap, sync::Arc};

use alloy_primitives::{keccak256, Address, U256};
use alloy_sol_types::SolEvent;
use tracing::{info, warn};

use crate::{
    auction::{AuctionInit, DutchAuction},
    automation::{AutomationRegistrar, FundingToken, UpkeepRequest},
    config::{AuctionParams, RegistryConfig},
    errors::{
        FactoryPaused, FundingReturnFailed, LedgerDeploymentFailed, OnlyFactoryOwner,
        RegistryError, UnknownAuction, UpkeepCancellationFailed, UpkeepFundingFailed,
        UpkeepRegistrationFailed,
    },
    events,
    host::{self, CallContext, Host},
    ledger::LedgerDeployer,
};

pub struct AuctionRegistry {
    owner: Address,
    config: RegistryConfig,
    host: Arc<dyn Host>,
    deployer: Arc<dyn LedgerDeployer>,
    funding_token: Arc<dyn FundingToken>,
    registrar: Arc<dyn AutomationRegistrar>,

    // optional safety: allow pausing new deployments
    paused: bool,

    pub(crate) auctions: Vec<Arc<DutchAuction>>,
    creators: Vec<Address>,
    valid: HashMap<Address, bool>,
    pub(crate) by_owner: HashMap<Address, Vec<Address>>,
    upkeeps: HashMap<Address, U256>,
}

impl AuctionRegistry {
    pub fn new(
        owner: Address,
        config: RegistryConfig,
        host: Arc<dyn Host>,
        deployer: Arc<dyn LedgerDeployer>,
        funding_token: Arc<dyn FundingToken>,
        registrar: Arc<dyn AutomationRegistrar>,
    ) -> Result<Self, RegistryError> {
        config.validate()?;
        Ok(Self {
            owner,
            config,
            host,
            deployer,
            funding_token,
            registrar,
            paused: false,
            auctions: Vec::new(),
            creators: Vec::new(),
            valid: HashMap::new(),
            by_owner: HashMap::new(),
            upkeeps: HashMap::new(),
        })
    }

    /// Admin: pause new auction deployments
    pub fn pause(&mut self, ctx: &CallContext) -> Result<(), RegistryError> {
        self.only_owner(ctx.sender)?;
        self.paused = true;
        self.emit(events::FactoryPaused {
            account: ctx.sender,
        });
        Ok(())
    }

    /// Admin: unpause new auction deployments
    pub fn unpause(&mut self, ctx: &CallContext) -> Result<(), RegistryError> {
        self.only_owner(ctx.sender)?;
        self.paused = false;
        self.emit(events::FactoryUnpaused {
            account: ctx.sender,
        });
        Ok(())
    }

    /// Deploys a new auction owned by the caller and registers its upkeep.
    ///
    /// The caller must have approved the registry for `upkeepFunding` of the
    /// funding token. Nothing is recorded unless every step succeeds.
    ///
    /// Steps run so that a failure leaves no minted supply behind: parameters are
    /// checked first, the token is deployed empty, the upkeep is funded and
    /// registered, and the supply is minted last. A mint failure cancels the
    /// upkeep and returns its budget to the creator.
    pub fn create_auction(
        &mut self,
        ctx: &CallContext,
        params: AuctionParams,
    ) -> Result<Address, RegistryError> {
        if self.paused {
            return Err(RegistryError::FactoryPaused(FactoryPaused {}));
        }
        DutchAuction::validate(&params, self.config.auction_duration)?;

        let next_id = U256::from(self.auctions.len() + 1);
        let creator = ctx.sender;
        let address = self.auction_address(next_id, creator, &params);

        let ledger = self
            .deployer
            .deploy(&params.name, &params.symbol, address)
            .map_err(|reason| {
                RegistryError::LedgerDeploymentFailed(LedgerDeploymentFailed {
                    reason: reason.into(),
                })
            })?;

        let upkeep_id = self.register_upkeep(creator, address, params.name.clone())?;

        let init = AuctionInit {
            address,
            owner: creator,
            automation: self.config.automation_forwarder,
            params,
            duration: self.config.auction_duration,
            distribution_batch_size: self.config.distribution_batch_size,
        };
        let auction = match DutchAuction::new(init, ledger, self.host.clone()) {
            Ok(auction) => auction,
            Err(err) => {
                warn!(%address, %upkeep_id, error = ?err, "auction rejected after registration");
                self.cancel_upkeep(creator, upkeep_id)?;
                return Err(err.into());
            }
        };

        // Book-keeping
        self.auctions.push(Arc::new(auction));
        self.creators.push(creator);
        self.valid.insert(address, true);
        self.by_owner.entry(creator).or_default().push(address);
        self.upkeeps.insert(address, upkeep_id);

        info!(%address, %creator, id = %next_id, %upkeep_id, "auction deployed");
        self.emit(events::AuctionCreated {
            auction: address,
            creator,
            id: next_id,
            upkeepId: upkeep_id,
        });
        Ok(address)
    }

    /// Tops up the automation budget of `auction` from the caller's funding tokens.
    pub fn fund_upkeep(
        &mut self,
        ctx: &CallContext,
        auction: Address,
        amount: U256,
    ) -> Result<(), RegistryError> {
        let upkeep_id = *self
            .upkeeps
            .get(&auction)
            .ok_or(RegistryError::UnknownAuction(UnknownAuction { auction }))?;

        self.pull_funding(ctx.sender, amount)?;
        if let Err(reason) = self
            .registrar
            .add_funds(self.config.address, upkeep_id, amount)
        {
            self.return_funding(ctx.sender, amount)?;
            return Err(RegistryError::UpkeepFundingFailed(UpkeepFundingFailed {
                reason: reason.into(),
            }));
        }

        info!(%auction, %upkeep_id, %amount, "upkeep funded");
        self.emit(events::UpkeepFunded {
            auction,
            upkeepId: upkeep_id,
            amount,
        });
        Ok(())
    }

    /// Get auction address by id
    pub fn get_auction(&self, id: U256) -> Address {
        self.index(id)
            .map(|index| self.auctions[index].address())
            .unwrap_or_default()
    }

    /// Get creator by id
    pub fn get_creator(&self, id: U256) -> Address {
        self.index(id)
            .map(|index| self.creators[index])
            .unwrap_or_default()
    }

    /// Count
    pub fn auction_count(&self) -> U256 {
        U256::from(self.auctions.len())
    }

    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    pub fn is_valid_auction(&self, auction: Address) -> bool {
        self.valid.get(&auction).copied().unwrap_or(false)
    }

    pub fn auction(&self, auction: Address) -> Option<Arc<DutchAuction>> {
        if !self.is_valid_auction(auction) {
            return None;
        }
        self.auctions
            .iter()
            .find(|candidate| candidate.address() == auction)
            .cloned()
    }

    pub fn upkeep_id(&self, auction: Address) -> Option<U256> {
        self.upkeeps.get(&auction).copied()
    }

    pub(crate) fn require_auction(
        &self,
        auction: Address,
    ) -> Result<Arc<DutchAuction>, RegistryError> {
        self.auction(auction)
            .ok_or(RegistryError::UnknownAuction(UnknownAuction { auction }))
    }

    /// CREATE2-style identity: the low 20 bytes of a hash binding the instance to
    /// the registry, creator, id and sale parameters.
    fn auction_address(&self, id: U256, creator: Address, params: &AuctionParams) -> Address {
        let mut salt_preimage = Vec::new();
        salt_preimage.extend_from_slice(self.config.address.as_slice());
        salt_preimage.extend_from_slice(&id.as_le_bytes());
        salt_preimage.extend_from_slice(creator.as_slice());
        salt_preimage.extend_from_slice(params.name.as_bytes());
        salt_preimage.extend_from_slice(params.symbol.as_bytes());
        salt_preimage.extend_from_slice(&params.total_supply.as_le_bytes());
        salt_preimage.extend_from_slice(&params.initial_price.as_le_bytes());
        salt_preimage.extend_from_slice(&params.reserve_price.as_le_bytes());
        salt_preimage.extend_from_slice(&params.minimum_bid.as_le_bytes());

        let salt = keccak256(salt_preimage);
        Address::from_slice(&salt[12..])
    }

    fn register_upkeep(
        &self,
        creator: Address,
        target: Address,
        name: String,
    ) -> Result<U256, RegistryError> {
        let amount = self.config.upkeep_funding;
        self.pull_funding(creator, amount)?;

        let request = UpkeepRequest {
            name,
            target,
            gas_limit: self.config.upkeep_gas_limit,
            admin: creator,
            amount,
        };
        match self.registrar.register_upkeep(self.config.address, &request) {
            Ok(upkeep_id) => Ok(upkeep_id),
            Err(reason) => {
                self.return_funding(creator, amount)?;
                Err(RegistryError::UpkeepRegistrationFailed(
                    UpkeepRegistrationFailed {
                        reason: reason.into(),
                    },
                ))
            }
        }
    }

    /// Moves `amount` from `from` into the registry and approves the registrar for it.
    fn pull_funding(&self, from: Address, amount: U256) -> Result<(), RegistryError> {
        let registry = self.config.address;
        let funding_failed = |reason: Vec<u8>| {
            RegistryError::UpkeepFundingFailed(UpkeepFundingFailed {
                reason: reason.into(),
            })
        };

        self.funding_token
            .transfer_from(registry, from, registry, amount)
            .map_err(funding_failed)?;
        if let Err(reason) = self
            .funding_token
            .approve(registry, self.registrar.address(), amount)
        {
            self.return_funding(from, amount)?;
            return Err(funding_failed(reason));
        }
        Ok(())
    }

    /// Withdraws the registrar's allowance and sends `amount` back to `to`.
    fn return_funding(&self, to: Address, amount: U256) -> Result<(), RegistryError> {
        let registry = self.config.address;
        let returned = self
            .funding_token
            .approve(registry, self.registrar.address(), U256::ZERO)
            .and_then(|()| self.funding_token.transfer(registry, to, amount));
        returned.map_err(|reason| {
            warn!(%to, %amount, reason = ?reason, "could not return upkeep funding");
            RegistryError::FundingReturnFailed(FundingReturnFailed {
                to,
                amount,
                reason: reason.into(),
            })
        })
    }

    fn cancel_upkeep(&self, creator: Address, upkeep_id: U256) -> Result<(), RegistryError> {
        let refunded = self
            .registrar
            .cancel_upkeep(self.config.address, upkeep_id)
            .map_err(|reason| {
                warn!(%upkeep_id, reason = ?reason, "could not cancel upkeep");
                RegistryError::UpkeepCancellationFailed(UpkeepCancellationFailed {
                    upkeepId: upkeep_id,
                    reason: reason.into(),
                })
            })?;
        self.return_funding(creator, refunded)
    }

    fn index(&self, id: U256) -> Option<usize> {
        let id = usize::try_from(id).ok()?;
        (1..=self.auctions.len()).contains(&id).then(|| id - 1)
    }

    fn only_owner(&self, caller: Address) -> Result<(), RegistryError> {
        if caller != self.owner {
            return Err(RegistryError::OnlyFactoryOwner(OnlyFactoryOwner { caller }));
        }
        Ok(())
    }

    fn emit<E: SolEvent>(&self, event: E) {
        host::log(self.host.as_ref(), self.config.address, event);
    }
}
