/*!

This is the long-form manual for `guthrie_voting` and the `guthrie` program.

## The Guthrie count

Every voter ranks all the candidates by distance, closest first. Voters with the same
ranking are grouped in blocs, and the count is run on the blocs.

Each round:
- the first-place votes of the remaining candidates are counted. A candidate with
  strictly more than half of the votes wins. If two candidates qualify, the earlier one
  (in name order) is elected.
- otherwise, the last-place votes are counted and the candidate with the most last-place
  votes is eliminated. A tie eliminates the later candidate.

The count stops when a candidate is elected. It never needs more rounds than there are
candidates.

## Generation methods

The voters are placed in a space of one or more axes. All coordinates are between 0 and 1
on the first axis. Each following axis is scaled down by the axis decay: with a decay of
0.5, the second axis spans `[0, 0.5]`, the third `[0, 0.25]`, and so on.

* `uniform`: voters evenly spaced on a single axis. Asking for more axes prints a
  warning and uses a single axis. This method does not consume random numbers.
* `random`: every coordinate is an independent uniform draw.
* `clustered`: on each axis, cluster centers are drawn at random. Each voter picks a
  cluster with a probability proportional to the number of voters already in it, and is
  placed around its center with a small normal spread.

## Candidate methods

* `exact`: the candidates are distinct voters picked at random.
* `primary`: a larger pool of `voters^primaryPower` candidates is picked, then the
  candidate with the fewest first-place votes is removed until the target number is
  reached. A tie removes the earlier candidate.

Candidates are named `A`, `B`, `C`... in the order of their first coordinate.

## Measures

For each trial:
- the utility of a candidate is the sum of its distances to all the voters (lower is better).
- the satisfaction of a candidate is 1 for the best candidate, 0 for a candidate of average
  utility, and negative below the average.
- the Condorcet winner is the candidate winning the most pairwise contests. A shared lead is
  reported as a cycle.
- the monotonicity check runs the count again without each losing candidate. The trial fails
  the check if one of these withdrawals changes the winner.
- the winners of plurality and instant-runoff are computed on the same ballots.

The summary reports, over all trials, how often the Guthrie winner had a majority in the first
round, how often the monotonicity check passed, how often a Condorcet cycle appeared, and for
each method the average satisfaction of its winner, how often it picked the best candidate,
and how often it picked the Condorcet winner.

## Configuration

`guthrie` comes with sensible defaults. Each setting can be given in a JSON configuration file
(`--config`) and overridden on the command line. All the keys are optional:

```text
{
  "trials": 1000,
  "voters": 1001,
  "candidates": 5,
  "method": "clustered",
  "axes": 2,
  "axisDecay": 0.5,
  "clusters": 3,
  "candidateMethod": "primary",
  "primaryPower": 0.4,
  "seed": 0,
  "showDistribution": false,
  "showBlocs": false,
  "showRounds": false
}
```

A seed of 0 picks a seed from the clock. The seed actually used is part of the output, so that
any simulation can be replayed.

The `show*` settings print diagnostics at the debug level: the histogram of the voters on each
axis, the blocs, and the tally of each round.

 */
