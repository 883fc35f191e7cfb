//! Contract ABI consumed by the client.
//!
//! All integer amounts are base units with 18 implied decimals.

use alloy::sol;

sol! {
    /// Staking token surface.
    interface IStakingToken {
        function balanceOf(address account) external view returns (uint256);
        function totalSupply() external view returns (uint256);
        function stakes(address account) external view returns (uint256 amount, uint256 timestamp, uint256 lockPeriod);
        function stake(uint256 amount) external;
        function unstake() external;
        function transfer(address to, uint256 amount) external returns (bool);
    }
}
